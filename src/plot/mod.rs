pub mod stack;

pub use stack::{stack, stacked_layers, StackedLayer, StackedPoint, TooltipValue};

use crate::run::ResultSet;
use crate::series::{align, smooth};
use crate::Bucket;
use serde::Serialize;

/// One series ready for the chart: aligned, zero-filled points plus the
/// legend details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSeries {
    pub label: String,
    pub color: String,
    pub hits: u64,
    pub points: Vec<Bucket>,
}

/// Aligns every series of `result` on a shared x axis. With `smooth_lines`,
/// zero points are dropped afterwards so lines bridge the gaps.
pub fn plot_series(result: &ResultSet, smooth_lines: bool) -> Vec<PlotSeries> {
    align(&result.series)
        .into_iter()
        .zip(&result.series)
        .map(|(points, series)| PlotSeries {
            label: series.info.alias.clone(),
            color: series.info.color.clone(),
            hits: series.hits,
            points: if smooth_lines { smooth(points) } else { points },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::run::RunId;
    use crate::series::{QuerySeries, SeriesInfo, ZeroFilled};
    use crate::TimeRange;

    fn result_set() -> ResultSet {
        let interval: Interval = "1m".parse().unwrap();
        let bounds = Some(TimeRange::new(0, 180_000));

        let mut a = ZeroFilled::new(interval, bounds);
        a.add_value(0, 2.0);
        let mut b = ZeroFilled::new(interval, bounds);
        b.add_value(120_000, 1.0);

        ResultSet {
            run_id: RunId(1),
            interval,
            hits_total: 2,
            range_count: 0,
            series: vec![
                QuerySeries::new(SeriesInfo::new("a", "#111"), a),
                QuerySeries::new(SeriesInfo::new("b", "#222"), b),
            ],
        }
    }

    #[test]
    fn test_plot_series_labels_and_alignment() {
        let plotted = plot_series(&result_set(), false);
        assert_eq!(plotted.len(), 2);
        assert_eq!(plotted[0].label, "a");
        assert_eq!(plotted[1].color, "#222");
        assert_eq!(plotted[0].points.len(), 4);
        assert_eq!(plotted[1].points.len(), 4);
        assert_eq!(plotted[1].points[2], Bucket::new(120_000, 1.0));
    }

    #[test]
    fn test_smooth_lines_after_alignment() {
        let plotted = plot_series(&result_set(), true);
        assert_eq!(plotted[0].points, vec![Bucket::new(0, 2.0)]);
        assert_eq!(plotted[1].points, vec![Bucket::new(120_000, 1.0)]);
    }

    #[test]
    fn test_serializes_points_as_pairs() {
        let plotted = plot_series(&result_set(), true);
        let json = serde_json::to_value(&plotted[0]).unwrap();
        assert_eq!(json["points"], serde_json::json!([[0, 2.0]]));
    }
}
