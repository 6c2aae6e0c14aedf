use super::Interval;
use crate::{PanelConfig, TimeRange};
use tracing::debug;

/// Canonical interval index paired with the widest raw bucket (ms) that still
/// snaps to it. Raw widths beyond the last ceiling snap to one year.
const SNAP_CEILINGS: [(usize, i64); 11] = [
    (0, 5_000),
    (1, 180_000),
    (2, 450_000),
    (3, 1_200_000),
    (4, 2_700_000),
    (5, 7_200_000),
    (6, 21_600_000),
    (7, 86_400_000),
    (8, 604_800_000),
    (9, 1_814_400_000),
    (10, 3_628_799_999),
];

/// Picks the canonical interval that yields roughly `target_points` buckets
/// over `range`.
///
/// The raw width `span / target_points` is snapped to the nearest canonical
/// entry rather than strictly rounded up, so the bucket count stays within a
/// small factor of the target on both sides. A zero target is treated as one.
pub fn select_interval(range: &TimeRange, target_points: u32) -> Interval {
    let raw_ms = range.span() / i64::from(target_points.max(1));

    let index = SNAP_CEILINGS
        .iter()
        .find(|(_, ceiling)| raw_ms <= *ceiling)
        .map(|(index, _)| *index)
        .unwrap_or(Interval::CANONICAL.len() - 1);

    Interval::CANONICAL[index]
}

/// Resolves the interval a run should bucket with.
///
/// A pinned interval is returned unchanged. With auto interval on, a missing or
/// inverted range, or a zero resolution, degrades to [`Interval::DEFAULT`].
pub fn compute_interval(range: Option<&TimeRange>, config: &PanelConfig) -> Interval {
    if !config.auto_int {
        return config
            .manual_interval()
            .unwrap_or(Interval::DEFAULT);
    }

    match range {
        Some(range) if range.is_valid() && config.resolution > 0 => {
            let interval = select_interval(range, config.resolution);
            debug!(
                "Auto interval {} for span {}ms at resolution {}",
                interval,
                range.span(),
                config.resolution
            );
            interval
        }
        _ => {
            debug!("No usable range for auto interval, using {}", Interval::DEFAULT);
            Interval::DEFAULT
        }
    }
}
