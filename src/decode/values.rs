use super::raw::{group_label, numeric_value, timestamp_millis, Document, Group};
use super::DecodeContext;
use crate::run::RunAccumulator;
use crate::series::{palette_color, QuerySeries, SeriesInfo};
use tracing::debug;

/// Adds one document to `series`. Every document is a hit, even one whose
/// time field cannot be read.
fn add_document(series: &mut QuerySeries, doc: &Document, time_field: &str, value_field: &str) {
    match doc.get(time_field).and_then(timestamp_millis) {
        Some(time) => {
            series
                .time_series
                .add_value(time, numeric_value(doc.get(value_field)));
        }
        None => debug!("Document has no usable '{}' field", time_field),
    }
    series.hits += 1;
}

/// Value mode with a group field: one series per group value, colored by
/// position. Within a run, a later segment adds to the series already holding
/// the same group value.
pub fn decode_grouped(
    groups: &[Group],
    value_field: &str,
    ctx: &DecodeContext<'_>,
    acc: &mut RunAccumulator,
) {
    for group in groups {
        let alias = group_label(&group.group_value);
        let index = match acc.series.iter().position(|s| s.info.alias == alias) {
            Some(index) => index,
            None => {
                let color = palette_color(acc.series.len());
                acc.series
                    .push(QuerySeries::new(SeriesInfo::new(alias, color), ctx.new_series()));
                acc.series.len() - 1
            }
        };

        let series = &mut acc.series[index];
        for doc in &group.doclist.docs {
            add_document(series, doc, ctx.time_field, value_field);
            acc.hits_total += 1;
        }
    }
}

/// Value mode without a group field: all documents feed one series.
pub fn decode_ungrouped(
    docs: &[Document],
    value_field: &str,
    ctx: &DecodeContext<'_>,
    acc: &mut RunAccumulator,
) {
    if acc.series.is_empty() {
        let info = ctx
            .queries
            .first()
            .map(|q| q.series_info(0))
            .unwrap_or_else(|| SeriesInfo::new("", palette_color(0)));
        acc.series.push(QuerySeries::new(info, ctx.new_series()));
    }

    let series = &mut acc.series[0];
    for doc in docs {
        add_document(series, doc, ctx.time_field, value_field);
        acc.hits_total += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::RawResponse;
    use crate::run::RunId;
    use crate::{PanelConfig, TimeRange};
    use serde_json::json;

    fn context(config: &PanelConfig) -> DecodeContext<'_> {
        DecodeContext::new(config, "1m".parse().unwrap(), Some(TimeRange::new(0, 180_000)))
    }

    #[test]
    fn test_grouped_series_per_group() {
        let config = PanelConfig::default();
        let ctx = context(&config);
        let raw: RawResponse = serde_json::from_value(json!({
            "grouped": {"host": {"groups": [
                {"groupValue": "a", "doclist": {"docs": [
                    {"timestamp": "1970-01-01T00:00:10Z", "bytes": 2},
                    {"timestamp": 130000, "bytes": "7"}
                ]}},
                {"groupValue": "b", "doclist": {"docs": [
                    {"timestamp": 60000, "bytes": 4}
                ]}}
            ]}}
        }))
        .unwrap();
        let mut acc = RunAccumulator::new(RunId(1), ctx.interval);

        decode_grouped(raw.groups_for("host").unwrap(), "bytes", &ctx, &mut acc);

        assert_eq!(acc.series.len(), 2);
        assert_eq!(acc.series[0].info, SeriesInfo::new("a", palette_color(0)));
        assert_eq!(acc.series[1].info, SeriesInfo::new("b", palette_color(1)));
        assert_eq!(acc.series[0].hits, 2);
        assert_eq!(acc.series[0].time_series.ordered_times(), vec![0, 120_000]);
        assert_eq!(acc.series[0].time_series.value_at(120_000), 7.0);
        assert_eq!(acc.hits_total, 3);
    }

    #[test]
    fn test_grouped_segments_extend_matching_group() {
        let config = PanelConfig::default();
        let ctx = context(&config);
        let mut acc = RunAccumulator::new(RunId(1), ctx.interval);

        let first: Vec<Group> = serde_json::from_value(json!([
            {"groupValue": "a", "doclist": {"docs": [{"timestamp": 0, "v": 1}]}}
        ]))
        .unwrap();
        let second: Vec<Group> = serde_json::from_value(json!([
            {"groupValue": "c", "doclist": {"docs": [{"timestamp": 0, "v": 5}]}},
            {"groupValue": "a", "doclist": {"docs": [{"timestamp": 60000, "v": 2}]}}
        ]))
        .unwrap();

        decode_grouped(&first, "v", &ctx, &mut acc);
        decode_grouped(&second, "v", &ctx, &mut acc);

        assert_eq!(acc.series.len(), 2);
        assert_eq!(acc.series[0].info.alias, "a");
        assert_eq!(acc.series[0].time_series.ordered_times(), vec![0, 60_000]);
        assert_eq!(acc.series[1].info.alias, "c");
        assert_eq!(acc.hits_total, 3);
    }

    #[test]
    fn test_ungrouped_counts_documents_not_values() {
        let config = PanelConfig::default();
        let ctx = context(&config);
        let docs: Vec<Document> = serde_json::from_value(json!([
            {"timestamp": 0, "load": 0.5},
            {"timestamp": 61000, "load": 1.5},
            {"load": 9},
            {"timestamp": 999999, "load": 3}
        ]))
        .unwrap();
        let mut acc = RunAccumulator::new(RunId(1), ctx.interval);

        decode_ungrouped(&docs, "load", &ctx, &mut acc);

        assert_eq!(acc.series.len(), 1);
        assert_eq!(acc.series[0].info.alias, "*:*");
        assert_eq!(acc.series[0].hits, 4);
        assert_eq!(acc.hits_total, 4);
        assert_eq!(acc.series[0].time_series.ordered_times(), vec![0, 60_000]);
        assert_eq!(acc.series[0].time_series.value_at(60_000), 1.5);
    }
}
