use crate::interval::Interval;
use crate::{Bucket, TimeRange};
use std::collections::BTreeMap;
use tracing::debug;

/// Bucketed series that stores only the values it was given and fills the
/// gaps with zeros when the points are emitted.
///
/// With bounds, buckets are anchored at `bounds.from` and emission covers the
/// whole `[from, to]` grid. Without bounds, buckets are anchored at the epoch
/// and only populated (or required) timestamps are emitted.
#[derive(Debug, Clone)]
pub struct ZeroFilled {
    interval: Interval,
    bounds: Option<TimeRange>,
    buckets: BTreeMap<i64, f64>,
}

impl ZeroFilled {
    pub fn new(interval: Interval, bounds: Option<TimeRange>) -> Self {
        Self {
            interval,
            bounds: bounds.filter(TimeRange::is_valid),
            buckets: BTreeMap::new(),
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bounds(&self) -> Option<TimeRange> {
        self.bounds
    }

    pub fn start_date(&self) -> Option<i64> {
        self.bounds.map(|b| b.from)
    }

    pub fn end_date(&self) -> Option<i64> {
        self.bounds.map(|b| b.to)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn anchor(&self) -> i64 {
        self.start_date().unwrap_or(0)
    }

    fn in_bounds(&self, timestamp: i64) -> bool {
        self.bounds.map_or(true, |b| b.contains(timestamp))
    }

    /// Start of the bucket `timestamp` falls into, or `None` when that start
    /// is not representable in `i64` milliseconds.
    pub fn bucket_for(&self, timestamp: i64) -> Option<i64> {
        let step = self.interval.millis();
        let anchor = self.anchor();
        let offset = timestamp.checked_sub(anchor)?.div_euclid(step);
        offset.checked_mul(step)?.checked_add(anchor)
    }

    /// Sets the bucket holding `timestamp` to `value`, replacing any earlier
    /// value. Timestamps outside the bounds, or whose bucket cannot be
    /// represented, are dropped and `false` returned.
    pub fn add_value(&mut self, timestamp: i64, value: f64) -> bool {
        if !self.in_bounds(timestamp) {
            debug!("Dropping value at {} outside series bounds {:?}", timestamp, self.bounds);
            return false;
        }
        let Some(bucket) = self.bucket_for(timestamp) else {
            debug!("Dropping value at {}: bucket start overflows", timestamp);
            return false;
        };
        self.buckets.insert(bucket, value);
        true
    }

    /// Value of the bucket starting exactly at `timestamp`, zero when unset.
    pub fn value_at(&self, timestamp: i64) -> f64 {
        self.buckets.get(&timestamp).copied().unwrap_or(0.0)
    }

    /// Timestamps that hold an explicitly added value, ascending.
    pub fn ordered_times(&self) -> Vec<i64> {
        self.buckets.keys().copied().collect()
    }

    /// Emits the zero-filled points.
    ///
    /// Bounded series cover every interval boundary from `start_date` up to
    /// `end_date`, with `end_date` itself always the last point. Any in-bounds
    /// `required_times` are merged in so several series can share one x axis.
    pub fn points(&self, required_times: &[i64]) -> Vec<Bucket> {
        let mut required: Vec<i64> = required_times
            .iter()
            .copied()
            .filter(|t| self.in_bounds(*t))
            .collect();
        required.sort_unstable();
        required.dedup();

        let base = match self.bounds {
            Some(bounds) => self.grid(bounds),
            None => self.ordered_times(),
        };

        merge_sorted(base, required)
            .into_iter()
            .map(|t| Bucket::new(t, self.value_at(t)))
            .collect()
    }

    fn grid(&self, bounds: TimeRange) -> Vec<i64> {
        let step = self.interval.millis();
        let capacity = (bounds.span() / step).saturating_add(2) as usize;
        let mut times = Vec::with_capacity(capacity);

        let mut t = bounds.from;
        while t <= bounds.to {
            times.push(t);
            t = match t.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        // Last point is clamped to the end even when it lands mid-interval.
        if times.last() != Some(&bounds.to) {
            times.push(bounds.to);
        }
        times
    }
}

fn merge_sorted(left: Vec<i64>, right: Vec<i64>) -> Vec<i64> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let next = match (left.peek().copied(), right.peek().copied()) {
            (Some(l), Some(r)) if l < r => left.next(),
            (Some(l), Some(r)) if l > r => right.next(),
            (Some(_), Some(_)) => {
                right.next();
                left.next()
            }
            (Some(_), None) => left.next(),
            (None, Some(_)) => right.next(),
            (None, None) => break,
        };
        merged.extend(next);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn minute() -> Interval {
        "1m".parse().unwrap()
    }

    fn pairs(points: &[Bucket]) -> Vec<(i64, f64)> {
        points.iter().map(|p| (p.timestamp, p.value)).collect()
    }

    #[test]
    fn test_zero_fills_between_values() {
        let mut series = ZeroFilled::new(minute(), Some(TimeRange::new(0, 120_000)));
        series.add_value(0, 5.0);
        series.add_value(120_000, 3.0);

        assert_eq!(
            pairs(&series.points(&[])),
            vec![(0, 5.0), (60_000, 0.0), (120_000, 3.0)]
        );
        assert_eq!(series.ordered_times(), vec![0, 120_000]);
    }

    #[test]
    fn test_add_value_rounds_down_relative_to_start() {
        let mut series = ZeroFilled::new(minute(), Some(TimeRange::new(10_000, 190_000)));
        series.add_value(69_999, 1.0);
        series.add_value(70_000, 2.0);

        assert_eq!(series.ordered_times(), vec![10_000, 70_000]);
        assert_eq!(series.value_at(10_000), 1.0);
        assert_eq!(series.value_at(70_000), 2.0);
    }

    #[test]
    fn test_add_value_replaces_existing_bucket() {
        let mut series = ZeroFilled::new(minute(), Some(TimeRange::new(0, 60_000)));
        series.add_value(1_000, 4.0);
        series.add_value(2_000, 7.0);

        assert_eq!(series.len(), 1);
        assert_eq!(series.value_at(0), 7.0);
    }

    #[test]
    fn test_out_of_bounds_values_are_dropped() {
        let mut series = ZeroFilled::new(minute(), Some(TimeRange::new(60_000, 120_000)));
        assert!(!series.add_value(59_999, 1.0));
        assert!(!series.add_value(120_001, 1.0));
        assert!(series.add_value(120_000, 1.0));
        assert_eq!(series.ordered_times(), vec![120_000]);
    }

    #[test]
    fn test_end_clamped_mid_interval() {
        let mut series = ZeroFilled::new(minute(), Some(TimeRange::new(0, 150_000)));
        series.add_value(130_000, 9.0);

        assert_eq!(
            pairs(&series.points(&[])),
            vec![(0, 0.0), (60_000, 0.0), (120_000, 9.0), (150_000, 0.0)]
        );
    }

    #[test]
    fn test_required_times_are_merged() {
        let mut series = ZeroFilled::new(minute(), Some(TimeRange::new(0, 120_000)));
        series.add_value(0, 1.0);

        let points = series.points(&[90_000, 30_000, 90_000, 500_000]);
        assert_eq!(
            pairs(&points),
            vec![
                (0, 1.0),
                (30_000, 0.0),
                (60_000, 0.0),
                (90_000, 0.0),
                (120_000, 0.0)
            ]
        );
    }

    #[test]
    fn test_unbounded_series_emits_only_known_times() {
        let mut series = ZeroFilled::new(minute(), None);
        series.add_value(185_000, 2.0);
        series.add_value(-30_000, 1.0);

        assert_eq!(series.ordered_times(), vec![-60_000, 180_000]);
        assert_eq!(
            pairs(&series.points(&[0])),
            vec![(-60_000, 1.0), (0, 0.0), (180_000, 2.0)]
        );
    }

    #[test]
    fn test_unrepresentable_buckets_are_dropped() {
        let mut series = ZeroFilled::new(minute(), None);
        assert!(!series.add_value(i64::MIN, 1.0));
        assert!(series.add_value(i64::MAX, 2.0));
        assert_eq!(series.ordered_times(), vec![i64::MAX - i64::MAX.rem_euclid(60_000)]);

        let extreme = TimeRange::new(i64::MAX - 120_000, i64::MAX);
        let mut bounded = ZeroFilled::new(minute(), Some(extreme));
        assert!(bounded.add_value(i64::MAX, 3.0));
        assert_eq!(bounded.bucket_for(i64::MIN), None);

        let points = bounded.points(&[]);
        assert_eq!(points[0].timestamp, extreme.from);
        assert_eq!(points[points.len() - 1].timestamp, i64::MAX);
        for pair in points.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_inverted_bounds_are_ignored() {
        let series = ZeroFilled::new(minute(), Some(TimeRange::new(10, 0)));
        assert!(series.bounds().is_none());
        assert!(series.points(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn points_cover_grid_with_zero_fill(
            buckets in 1i64..200,
            offsets in proptest::collection::vec(0i64..12_000_000, 0..50),
        ) {
            let step = 60_000;
            let bounds = TimeRange::new(1_000, 1_000 + buckets * step);
            let mut series = ZeroFilled::new(minute(), Some(bounds));
            for offset in &offsets {
                series.add_value(bounds.from + offset % (bounds.span() + 1), 1.0);
            }

            let points = series.points(&[]);
            prop_assert_eq!(points.len() as i64, buckets + 1);
            prop_assert_eq!(points[0].timestamp, bounds.from);
            prop_assert_eq!(points[points.len() - 1].timestamp, bounds.to);
            for pair in points.windows(2) {
                prop_assert_eq!(pair[1].timestamp - pair[0].timestamp, step);
            }
            let added = series.ordered_times();
            for point in &points {
                if !added.contains(&point.timestamp) {
                    prop_assert_eq!(point.value, 0.0);
                }
            }

            let again = series.points(&[]);
            prop_assert_eq!(points, again);
        }
    }
}
