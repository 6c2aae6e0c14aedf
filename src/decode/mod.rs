pub mod count;
pub mod raw;
pub mod values;

pub use raw::{parse_error, Document, Group, RawResponse};

use crate::error::{PanelError, PanelResult};
use crate::interval::Interval;
use crate::run::RunAccumulator;
use crate::series::ZeroFilled;
use crate::{HitsPolicy, Mode, PanelConfig, QueryInfo, TimeRange};
use tracing::debug;

/// Which of the three response shapes a run decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodePlan {
    /// Flat `(timestamp, count)` facet entries, one series per query.
    Count,
    /// Document lists per group, one series per group value.
    GroupedValue {
        group_field: String,
        value_field: String,
    },
    /// One flat document list feeding a single series.
    UngroupedValue { value_field: String },
}

impl DecodePlan {
    pub fn from_config(config: &PanelConfig) -> PanelResult<Self> {
        match config.mode {
            Mode::Count => Ok(DecodePlan::Count),
            Mode::Values => {
                let value_field = non_empty(&config.value_field).ok_or_else(|| {
                    PanelError::Configuration {
                        message: format!("In {} mode a field must be specified", config.mode),
                    }
                })?;
                Ok(match non_empty(&config.group_field) {
                    Some(group_field) => DecodePlan::GroupedValue {
                        group_field,
                        value_field,
                    },
                    None => DecodePlan::UngroupedValue { value_field },
                })
            }
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.as_deref().filter(|f| !f.is_empty()).map(str::to_string)
}

/// Per-run settings the decoders read.
#[derive(Debug, Clone)]
pub struct DecodeContext<'a> {
    pub time_field: &'a str,
    pub range_field: &'a str,
    pub queries: Vec<QueryInfo>,
    pub interval: Interval,
    pub bounds: Option<TimeRange>,
    pub hits_policy: HitsPolicy,
}

impl<'a> DecodeContext<'a> {
    pub fn new(config: &'a PanelConfig, interval: Interval, bounds: Option<TimeRange>) -> Self {
        Self {
            time_field: &config.time_field,
            range_field: &config.range_field,
            queries: config.active_queries(),
            interval,
            bounds,
            hits_policy: config.hits_policy,
        }
    }

    pub fn new_series(&self) -> ZeroFilled {
        ZeroFilled::new(self.interval, self.bounds)
    }
}

/// A response already checked to carry the section its plan reads.
enum RawShape<'r> {
    FlatCounts(Vec<(i64, u64)>),
    Groups {
        groups: &'r [Group],
        value_field: &'r str,
    },
    Docs {
        docs: &'r [Document],
        value_field: &'r str,
    },
}

impl<'r> RawShape<'r> {
    fn extract(
        plan: &'r DecodePlan,
        raw: &'r RawResponse,
        ctx: &DecodeContext<'_>,
    ) -> PanelResult<Self> {
        Ok(match plan {
            DecodePlan::Count => {
                RawShape::FlatCounts(count::flat_pairs(raw.facet_counts_for(ctx.range_field)?))
            }
            DecodePlan::GroupedValue {
                group_field,
                value_field,
            } => RawShape::Groups {
                groups: raw.groups_for(group_field)?,
                value_field: value_field.as_str(),
            },
            DecodePlan::UngroupedValue { value_field } => RawShape::Docs {
                docs: raw.docs()?,
                value_field: value_field.as_str(),
            },
        })
    }
}

/// Folds one result segment into the run's accumulator.
///
/// The response is validated before anything is touched, so an error leaves
/// `acc` exactly as it was. For segments after the first, an absolute-hits
/// backend restarts every hit counter before the segment is applied.
pub fn decode(
    plan: &DecodePlan,
    raw: &RawResponse,
    ctx: &DecodeContext<'_>,
    acc: &mut RunAccumulator,
    segment: usize,
) -> PanelResult<()> {
    let shape = RawShape::extract(plan, raw, ctx)?;

    if segment > 0 && ctx.hits_policy == HitsPolicy::Absolute {
        acc.reset_hits();
    }

    match shape {
        RawShape::FlatCounts(pairs) => count::decode_counts(&pairs, ctx, acc),
        RawShape::Groups {
            groups,
            value_field,
        } => values::decode_grouped(groups, value_field, ctx, acc),
        RawShape::Docs { docs, value_field } => {
            values::decode_ungrouped(docs, value_field, ctx, acc)
        }
    }

    debug!(
        "Decoded segment {} of run {}: {} series, {} hits",
        segment,
        acc.run_id,
        acc.series.len(),
        acc.hits_total
    );
    Ok(())
}
