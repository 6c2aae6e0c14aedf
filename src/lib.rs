pub mod decode;
pub mod error;
pub mod interval;
pub mod plot;
pub mod run;
pub mod series;
pub mod transport;

use decode::RawResponse;
use error::{PanelError, PanelResult};
use interval::Interval;
use plot::{PlotSeries, StackedLayer, TooltipValue};
use run::{Ingested, ResultSet, RunCoordinator, RunId};
use serde::{Deserialize, Serialize};
use series::{palette_color, SeriesInfo};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;
use transport::{FetchRequest, QueryExecutor, RangeProvider};

/// Inclusive span of time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn is_valid(&self) -> bool {
        self.from <= self.to
    }

    /// Length in ms, zero for an inverted range.
    pub fn span(&self) -> i64 {
        self.to.saturating_sub(self.from).max(0)
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.from <= timestamp && timestamp <= self.to
    }

    /// Scales the span around its centre: 0.5 halves it, 2.0 doubles it.
    pub fn zoom(&self, factor: f64) -> TimeRange {
        // Float arithmetic: the endpoint difference can exceed i64.
        let span = self.to as f64 - self.from as f64;
        let center = self.to as f64 - span / 2.0;
        TimeRange {
            from: (center - span * factor / 2.0) as i64,
            to: (center + span * factor / 2.0) as i64,
        }
    }
}

/// A `(timestamp, value)` chart point. Serializes as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, f64)", into = "(i64, f64)")]
pub struct Bucket {
    pub timestamp: i64,
    pub value: f64,
}

impl Bucket {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(i64, f64)> for Bucket {
    fn from((timestamp, value): (i64, f64)) -> Self {
        Self { timestamp, value }
    }
}

impl From<Bucket> for (i64, f64) {
    fn from(bucket: Bucket) -> Self {
        (bucket.timestamp, bucket.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Bucket counts from range facets.
    #[default]
    Count,
    /// Per-document values from a configured field.
    Values,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Count => f.write_str("count"),
            Mode::Values => f.write_str("values"),
        }
    }
}

impl FromStr for Mode {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "count" => Ok(Mode::Count),
            "values" => Ok(Mode::Values),
            other => Err(PanelError::Configuration {
                message: format!("unknown mode '{}'", other),
            }),
        }
    }
}

/// How hit counters behave when a run delivers more than one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitsPolicy {
    /// Each segment reports new hits that add to the previous ones.
    #[default]
    Accumulate,
    /// Each segment reports the full totals so far; counters restart.
    Absolute,
}

impl FromStr for HitsPolicy {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "accumulate" => Ok(HitsPolicy::Accumulate),
            "absolute" => Ok(HitsPolicy::Absolute),
            other => Err(PanelError::Configuration {
                message: format!("unknown hits policy '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryInfo {
    pub id: u32,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl QueryInfo {
    pub fn new(id: u32, query: impl Into<String>) -> Self {
        Self {
            id,
            query: query.into(),
            alias: None,
            color: None,
        }
    }

    /// Legend entry for the query drawn at `index`: the alias, else the query
    /// text, colored from the palette unless a color is set.
    pub fn series_info(&self, index: usize) -> SeriesInfo {
        SeriesInfo::new(
            self.alias.clone().unwrap_or_else(|| self.query.clone()),
            self.color
                .clone()
                .unwrap_or_else(|| palette_color(index).to_string()),
        )
    }
}

impl Default for QueryInfo {
    fn default() -> Self {
        Self::new(0, "*:*")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub mode: Mode,
    pub time_field: String,
    pub range_field: String,
    pub queries: Vec<QueryInfo>,
    pub max_rows: usize,
    pub value_field: Option<String>,
    pub group_field: Option<String>,
    pub auto_int: bool,
    pub resolution: u32,
    pub interval: String,
    pub hits_policy: HitsPolicy,
    pub stack: bool,
    pub percentage: bool,
    pub lines_smooth: bool,
    pub tooltip_value: TooltipValue,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Count,
            time_field: "timestamp".to_string(),
            range_field: "timestamp".to_string(),
            queries: vec![QueryInfo::default()],
            max_rows: 100_000,
            value_field: None,
            group_field: None,
            auto_int: true,
            resolution: 100,
            interval: "5m".to_string(),
            hits_policy: HitsPolicy::Accumulate,
            stack: true,
            percentage: false,
            lines_smooth: false,
            tooltip_value: TooltipValue::Cumulative,
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("RANGEFACET_MODE") {
            config.mode = mode.parse().unwrap_or(config.mode);
        }

        if let Ok(field) = std::env::var("RANGEFACET_TIME_FIELD") {
            config.time_field = field;
        }

        if let Ok(field) = std::env::var("RANGEFACET_RANGE_FIELD") {
            config.range_field = field;
        }

        if let Ok(field) = std::env::var("RANGEFACET_VALUE_FIELD") {
            config.value_field = Some(field).filter(|f| !f.is_empty());
        }

        if let Ok(field) = std::env::var("RANGEFACET_GROUP_FIELD") {
            config.group_field = Some(field).filter(|f| !f.is_empty());
        }

        if let Ok(resolution) = std::env::var("RANGEFACET_RESOLUTION") {
            config.resolution = resolution.parse().unwrap_or(config.resolution);
        }

        if let Ok(interval) = std::env::var("RANGEFACET_INTERVAL") {
            if let Err(err) = config.set_interval(&interval) {
                warn!("Ignoring RANGEFACET_INTERVAL={:?}: {}", interval, err);
            }
        }

        if let Ok(max_rows) = std::env::var("RANGEFACET_MAX_ROWS") {
            config.max_rows = max_rows.parse().unwrap_or(config.max_rows);
        }

        if let Ok(policy) = std::env::var("RANGEFACET_HITS_POLICY") {
            config.hits_policy = policy.parse().unwrap_or(config.hits_policy);
        }

        config
    }

    pub fn from_file(path: impl AsRef<Path>) -> PanelResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// `"auto"` switches auto interval back on; anything else pins that
    /// interval.
    pub fn set_interval(&mut self, label: &str) -> PanelResult<()> {
        if label == "auto" {
            self.auto_int = true;
            return Ok(());
        }
        let interval: Interval = label.parse()?;
        self.auto_int = false;
        self.interval = interval.label();
        Ok(())
    }

    pub fn manual_interval(&self) -> Option<Interval> {
        self.interval.parse().ok()
    }

    /// Menu label for `label`, marked when auto interval picked it.
    pub fn interval_label(&self, label: &str) -> String {
        if self.auto_int && label == self.interval {
            format!("{} (auto)", label)
        } else {
            label.to_string()
        }
    }

    /// Queries to draw; a config without any draws the match-all query.
    pub fn active_queries(&self) -> Vec<QueryInfo> {
        if self.queries.is_empty() {
            vec![QueryInfo::default()]
        } else {
            self.queries.clone()
        }
    }
}

/// One chart panel: configuration, the backend it fetches from, the range it
/// follows, and the runs it has made.
pub struct Panel<E, R> {
    config: PanelConfig,
    executor: E,
    ranges: R,
    coordinator: RunCoordinator,
}

impl<E: QueryExecutor, R: RangeProvider> Panel<E, R> {
    pub fn new(config: PanelConfig, executor: E, ranges: R) -> Self {
        Self {
            config,
            executor,
            ranges,
            coordinator: RunCoordinator::new(),
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PanelConfig {
        &mut self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn coordinator(&self) -> &RunCoordinator {
        &self.coordinator
    }

    pub fn compute_interval(&self) -> Interval {
        interval::compute_interval(self.ranges.time_range().as_ref(), &self.config)
    }

    /// Runs a complete fetch: starts a run and feeds every segment the
    /// executor delivers through [`Panel::ingest_result`].
    pub async fn refresh(&mut self) -> PanelResult<Option<ResultSet>> {
        let ticket = self.coordinator.begin_run(
            &self.config,
            self.ranges.time_range(),
            self.ranges.facet_range(),
        )?;
        // Remember the auto-selected interval so menus can show it.
        if self.config.auto_int {
            self.config.interval = ticket.interval.label();
        }

        let mut latest = None;
        for segment in 0..self.executor.segment_count() {
            let request = FetchRequest::new(&ticket, segment, &self.config);
            let raw = match self.executor.execute(&request).await {
                Ok(raw) => raw,
                Err(err) => {
                    self.coordinator.report_error(&err);
                    return Err(err);
                }
            };

            match self.ingest_result(&raw, ticket.run_id, segment)? {
                Ingested::Applied(result) => latest = Some(result),
                Ingested::Discarded => break,
            }
        }
        Ok(latest)
    }

    pub fn ingest_result(
        &mut self,
        raw: &RawResponse,
        run_id: RunId,
        segment: usize,
    ) -> PanelResult<Ingested> {
        self.coordinator.ingest(&self.config, raw, run_id, segment)
    }

    /// Chart-ready series of the last good result.
    pub fn plot_series(&self) -> Vec<PlotSeries> {
        self.coordinator
            .last_result()
            .map(|result| plot::plot_series(result, self.config.lines_smooth))
            .unwrap_or_default()
    }

    /// Stack layers of the last good result, following the panel's stack,
    /// percentage and tooltip settings. `None` when stacking is off.
    pub fn stacked_series(&self) -> Option<Vec<StackedLayer>> {
        if !self.config.stack {
            return None;
        }
        Some(plot::stacked_layers(
            &self.plot_series(),
            self.config.percentage,
            self.config.tooltip_value,
        ))
    }

    pub fn hits(&self) -> u64 {
        self.coordinator
            .last_result()
            .map(|result| result.hits_total)
            .unwrap_or(0)
    }

    pub fn error(&self) -> Option<&str> {
        self.coordinator.error()
    }
}
