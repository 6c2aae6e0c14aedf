use super::QuerySeries;
use crate::Bucket;

/// Ascending, deduplicated union of every series' populated timestamps.
pub fn required_times(series: &[QuerySeries]) -> Vec<i64> {
    let mut times: Vec<i64> = series
        .iter()
        .flat_map(|s| s.time_series.ordered_times())
        .collect();
    times.sort_unstable();
    times.dedup();
    times
}

/// Emits each series' points against a shared x axis.
///
/// When two or more series are drawn together every series gets a point
/// (real or zero) wherever any series has data, so stacked sums line up.
/// A single series is emitted on its own.
pub fn align(series: &[QuerySeries]) -> Vec<Vec<Bucket>> {
    if series.len() < 2 {
        return series.iter().map(|s| s.time_series.points(&[])).collect();
    }

    let required = required_times(series);
    series
        .iter()
        .map(|s| s.time_series.points(&required))
        .collect()
}

/// Drops zero-valued points so a line chart skips the gaps instead of
/// dipping to the axis. Only ever applied after [`align`].
pub fn smooth(points: Vec<Bucket>) -> Vec<Bucket> {
    points.into_iter().filter(|p| p.value != 0.0).collect()
}
