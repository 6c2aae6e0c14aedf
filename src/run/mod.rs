pub mod coordinator;

pub use coordinator::{Ingested, RunCoordinator, RunTicket};

use crate::interval::Interval;
use crate::series::QuerySeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one fetch run. Later runs always carry larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decoded series of one run, as handed to renderers.
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub run_id: RunId,
    pub interval: Interval,
    pub hits_total: u64,
    /// Facet entries in the latest count-mode segment.
    pub range_count: usize,
    pub series: Vec<QuerySeries>,
}

/// Series state being built up across the segments of a single run.
///
/// Created when segment 0 arrives and dropped when the next run starts.
#[derive(Debug)]
pub struct RunAccumulator {
    pub run_id: RunId,
    pub interval: Interval,
    pub series: Vec<QuerySeries>,
    pub hits_total: u64,
    pub range_count: usize,
}

impl RunAccumulator {
    pub fn new(run_id: RunId, interval: Interval) -> Self {
        Self {
            run_id,
            interval,
            series: Vec::new(),
            hits_total: 0,
            range_count: 0,
        }
    }

    /// Zeroes the dataset and per-series hit counters, keeping the buckets.
    pub fn reset_hits(&mut self) {
        self.hits_total = 0;
        for series in &mut self.series {
            series.hits = 0;
        }
    }

    pub fn snapshot(&self) -> ResultSet {
        ResultSet {
            run_id: self.run_id,
            interval: self.interval,
            hits_total: self.hits_total,
            range_count: self.range_count,
            series: self.series.clone(),
        }
    }
}
