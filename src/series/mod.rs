pub mod align;
pub mod zero_filled;

pub use align::{align, required_times, smooth};
pub use zero_filled::ZeroFilled;

use serde::{Deserialize, Serialize};

/// Colors handed out to series by position.
pub const PALETTE: [&str; 24] = [
    "#7EB26D", "#EAB839", "#6ED0E0", "#EF843C", "#E24D42", "#1F78C1",
    "#BA43A9", "#705DA0", "#508642", "#CCA300", "#447EBC", "#C15C17",
    "#890F02", "#0A437C", "#6D1F62", "#584477", "#B7DBAB", "#F4D598",
    "#70DBED", "#F9BA8F", "#F29191", "#82B5D8", "#E5A8E2", "#AEA2E0",
];

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub alias: String,
    pub color: String,
}

impl SeriesInfo {
    pub fn new(alias: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            color: color.into(),
        }
    }
}

/// One logical line (or bar stack layer) of the chart.
#[derive(Debug, Clone)]
pub struct QuerySeries {
    pub info: SeriesInfo,
    pub time_series: ZeroFilled,
    pub hits: u64,
}

impl QuerySeries {
    pub fn new(info: SeriesInfo, time_series: ZeroFilled) -> Self {
        Self {
            info,
            time_series,
            hits: 0,
        }
    }
}
