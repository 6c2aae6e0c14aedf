use super::PlotSeries;
use crate::Bucket;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a tooltip over a stacked point reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipValue {
    /// Height of the stack up to and including this series.
    #[default]
    Cumulative,
    /// This series' own contribution.
    Individual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StackedPoint {
    pub timestamp: i64,
    pub bottom: f64,
    pub top: f64,
}

impl StackedPoint {
    pub fn tooltip_value(&self, kind: TooltipValue) -> f64 {
        match kind {
            TooltipValue::Cumulative => self.top,
            TooltipValue::Individual => self.top - self.bottom,
        }
    }
}

/// Stacks series in order, each layer resting on the running total at the
/// same timestamp. In percentage mode every timestamp is scaled so the full
/// stack reaches 100; a timestamp with a zero total stays at 0.
pub fn stack(series: &[PlotSeries], percentage: bool) -> Vec<Vec<StackedPoint>> {
    let mut totals: BTreeMap<i64, f64> = BTreeMap::new();
    if percentage {
        for point in series.iter().flat_map(|s| &s.points) {
            *totals.entry(point.timestamp).or_default() += point.value;
        }
    }

    let mut running: BTreeMap<i64, f64> = BTreeMap::new();
    series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .map(|point| {
                    let value = if percentage {
                        match totals.get(&point.timestamp) {
                            Some(total) if *total != 0.0 => point.value * 100.0 / total,
                            _ => 0.0,
                        }
                    } else {
                        point.value
                    };
                    let bottom = running.entry(point.timestamp).or_default();
                    let stacked = StackedPoint {
                        timestamp: point.timestamp,
                        bottom: *bottom,
                        top: *bottom + value,
                    };
                    *bottom = stacked.top;
                    stacked
                })
                .collect()
        })
        .collect()
}

/// One series drawn as a stack layer, with the value its tooltip shows at
/// each timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedLayer {
    pub label: String,
    pub color: String,
    pub points: Vec<StackedPoint>,
    pub tooltips: Vec<Bucket>,
}

pub fn stacked_layers(
    series: &[PlotSeries],
    percentage: bool,
    tooltip: TooltipValue,
) -> Vec<StackedLayer> {
    stack(series, percentage)
        .into_iter()
        .zip(series)
        .map(|(points, s)| StackedLayer {
            label: s.label.clone(),
            color: s.color.clone(),
            tooltips: points
                .iter()
                .map(|p| Bucket::new(p.timestamp, p.tooltip_value(tooltip)))
                .collect(),
            points,
        })
        .collect()
}
