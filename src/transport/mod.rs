pub mod file;
pub mod memory;

pub use file::FileExecutor;
pub use memory::MemoryExecutor;

use crate::decode::RawResponse;
use crate::error::PanelResult;
use crate::interval::Interval;
use crate::run::{RunId, RunTicket};
use crate::{Mode, PanelConfig, QueryInfo, TimeRange};
use async_trait::async_trait;
use serde::Serialize;

/// Backend-neutral description of one segment fetch. Executors turn it into
/// whatever request their backend speaks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchRequest {
    pub run_id: RunId,
    pub segment: usize,
    pub interval: Interval,
    pub range: Option<TimeRange>,
    pub mode: Mode,
    pub time_field: String,
    pub range_field: String,
    pub value_field: Option<String>,
    pub group_field: Option<String>,
    pub max_rows: usize,
    pub queries: Vec<QueryInfo>,
}

impl FetchRequest {
    pub fn new(ticket: &RunTicket, segment: usize, config: &PanelConfig) -> Self {
        Self {
            run_id: ticket.run_id,
            segment,
            interval: ticket.interval,
            range: ticket.bounds,
            mode: config.mode,
            time_field: config.time_field.clone(),
            range_field: config.range_field.clone(),
            value_field: config.value_field.clone(),
            group_field: config.group_field.clone(),
            max_rows: config.max_rows,
            queries: config.active_queries(),
        }
    }
}

/// Executes fetches against a backend and hands back its raw response.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: &FetchRequest) -> PanelResult<RawResponse>;

    /// Number of segments one run is split into.
    fn segment_count(&self) -> usize {
        1
    }
}

/// Supplies the active time range. The facet range bounds the series and
/// defaults to the time range.
pub trait RangeProvider {
    fn time_range(&self) -> Option<TimeRange>;

    fn facet_range(&self) -> Option<TimeRange> {
        self.time_range()
    }
}

impl RangeProvider for TimeRange {
    fn time_range(&self) -> Option<TimeRange> {
        Some(*self)
    }
}

impl RangeProvider for Option<TimeRange> {
    fn time_range(&self) -> Option<TimeRange> {
        *self
    }
}
