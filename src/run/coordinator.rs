use super::{ResultSet, RunAccumulator, RunId};
use crate::decode::{decode, parse_error, DecodeContext, DecodePlan, RawResponse};
use crate::error::{PanelError, PanelResult};
use crate::interval::{compute_interval, Interval};
use crate::{PanelConfig, TimeRange};
use tracing::{debug, info, warn};

/// What the coordinator did with an arriving result.
#[derive(Debug, Clone)]
pub enum Ingested {
    /// The result belonged to the active run and was folded in.
    Applied(ResultSet),
    /// The result belonged to a superseded or abandoned run and was dropped.
    Discarded,
}

/// Handed out when a run starts; everything a fetch for that run needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunTicket {
    pub run_id: RunId,
    pub interval: Interval,
    /// Bounds the run's series are zero-filled over.
    pub bounds: Option<TimeRange>,
}

#[derive(Debug)]
struct ActiveRun {
    ticket: RunTicket,
    accumulator: Option<RunAccumulator>,
}

/// Decides which run's results are applied.
///
/// Starting a run invalidates every earlier one; results still in flight for
/// those runs are dropped on arrival. The last successfully applied result set
/// stays available for rendering until a newer one replaces it.
#[derive(Debug, Default)]
pub struct RunCoordinator {
    last_run: u64,
    active: Option<ActiveRun>,
    last_good: Option<ResultSet>,
    error: Option<String>,
}

impl RunCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active.as_ref().map(|a| a.ticket.run_id)
    }

    pub fn last_result(&self) -> Option<&ResultSet> {
        self.last_good.as_ref()
    }

    /// User-visible message from the latest failure, cleared when a run starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Starts a new run, superseding any run still in flight.
    ///
    /// The interval comes from `time_range`; series are bounded by
    /// `facet_range`, falling back to `time_range`. An unusable config is
    /// reported and leaves no run active.
    pub fn begin_run(
        &mut self,
        config: &PanelConfig,
        time_range: Option<TimeRange>,
        facet_range: Option<TimeRange>,
    ) -> PanelResult<RunTicket> {
        self.error = None;
        self.active = None;
        self.last_run += 1;
        let run_id = RunId(self.last_run);

        if let Err(err) = DecodePlan::from_config(config) {
            warn!("Not starting run {}: {}", run_id, err);
            self.error = Some(err.user_message());
            return Err(err);
        }

        let ticket = RunTicket {
            run_id,
            interval: compute_interval(time_range.as_ref(), config),
            bounds: facet_range.or(time_range),
        };
        info!("Starting run {} with interval {}", run_id, ticket.interval);

        self.active = Some(ActiveRun {
            ticket,
            accumulator: None,
        });
        Ok(ticket)
    }

    /// Applies one result segment of `run_id`.
    ///
    /// Results for any run other than the active one are discarded without
    /// touching state. A backend error is surfaced and keeps the last good
    /// result. A configuration error abandons the run.
    pub fn ingest(
        &mut self,
        config: &PanelConfig,
        raw: &RawResponse,
        run_id: RunId,
        segment: usize,
    ) -> PanelResult<Ingested> {
        if self.active_run() != Some(run_id) {
            debug!("Discarding segment {} of superseded run {}", segment, run_id);
            return Ok(Ingested::Discarded);
        }

        if let Some(payload) = &raw.error {
            let message = parse_error(&payload.msg);
            warn!("Run {} failed on the backend: {}", run_id, message);
            self.error = Some(message.clone());
            return Err(PanelError::Backend { message });
        }

        let plan = match DecodePlan::from_config(config) {
            Ok(plan) => plan,
            Err(err) => {
                warn!("Abandoning run {}: {}", run_id, err);
                self.active = None;
                self.error = Some(err.user_message());
                return Err(err);
            }
        };

        let Some(active) = self.active.as_mut() else {
            return Ok(Ingested::Discarded);
        };
        let ticket = active.ticket;
        let ctx = DecodeContext::new(config, ticket.interval, ticket.bounds);

        let mut accumulator = match active.accumulator.take() {
            Some(acc) if segment > 0 => acc,
            _ => RunAccumulator::new(run_id, ticket.interval),
        };

        match decode(&plan, raw, &ctx, &mut accumulator, segment) {
            Ok(()) => {
                let result = accumulator.snapshot();
                active.accumulator = Some(accumulator);
                self.last_good = Some(result.clone());
                Ok(Ingested::Applied(result))
            }
            Err(err) => {
                if segment > 0 {
                    active.accumulator = Some(accumulator);
                }
                warn!("Run {} segment {} rejected: {}", run_id, segment, err);
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Records a failure that happened outside of decoding, such as the
    /// transport failing to deliver a result.
    pub fn report_error(&mut self, err: &PanelError) {
        warn!("Panel error: {}", err);
        self.error = Some(err.user_message());
    }

    /// Drops the active run; anything still in flight for it is discarded.
    pub fn abandon(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Abandoned run {}", active.ticket.run_id);
        }
    }
}
