use super::raw::timestamp_millis;
use super::DecodeContext;
use crate::run::RunAccumulator;
use crate::series::QuerySeries;
use serde_json::Value;
use tracing::debug;

/// Splits interleaved facet entries into `(timestamp, count)` pairs. A
/// dangling timestamp or an entry that does not parse is skipped.
pub fn flat_pairs(counts: &[Value]) -> Vec<(i64, u64)> {
    let mut pairs = Vec::with_capacity(counts.len() / 2);

    for entry in counts.chunks(2) {
        let [time, count] = entry else {
            debug!("Ignoring trailing facet entry {:?}", entry);
            continue;
        };
        let count = count
            .as_u64()
            .or_else(|| count.as_f64().filter(|c| *c >= 0.0).map(|c| c.round() as u64));
        match (timestamp_millis(time), count) {
            (Some(time), Some(count)) => pairs.push((time, count)),
            _ => debug!("Skipping unreadable facet entry {:?}", entry),
        }
    }

    pairs
}

/// Count mode: every active query gets its own series fed from the facet
/// counts. Series from earlier segments of the run are reused in place.
pub fn decode_counts(pairs: &[(i64, u64)], ctx: &DecodeContext<'_>, acc: &mut RunAccumulator) {
    acc.range_count = pairs.len();

    for (i, query) in ctx.queries.iter().enumerate() {
        if acc.series.len() <= i {
            acc.series
                .push(QuerySeries::new(query.series_info(i), ctx.new_series()));
        }
        let series = &mut acc.series[i];
        series.info = query.series_info(i);

        for &(time, count) in pairs {
            series.time_series.add_value(time, count as f64);
            series.hits += count;
            acc.hits_total += count;
        }
    }
}
