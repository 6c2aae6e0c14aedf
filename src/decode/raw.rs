//! Solr-shaped backend responses, as handed over by the query executor.

use crate::error::{PanelError, PanelResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_counts: Option<FacetCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouped: Option<HashMap<String, GroupedField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<DocList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetCounts {
    #[serde(default)]
    pub facet_ranges: HashMap<String, FacetRange>,
}

/// `counts` interleaves bucket start and count: `[t0, c0, t1, c1, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetRange {
    #[serde(default)]
    pub counts: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedField {
    #[serde(default)]
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "groupValue", default)]
    pub group_value: Value,
    #[serde(default)]
    pub doclist: DocList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocList {
    #[serde(default)]
    pub docs: Vec<Document>,
}

impl RawResponse {
    pub fn from_json(text: &str) -> PanelResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn facet_counts_for(&self, range_field: &str) -> PanelResult<&[Value]> {
        self.facet_counts
            .as_ref()
            .and_then(|f| f.facet_ranges.get(range_field))
            .map(|r| r.counts.as_slice())
            .ok_or_else(|| PanelError::MalformedResult {
                message: format!("no facet range counts for field '{}'", range_field),
            })
    }

    pub fn groups_for(&self, group_field: &str) -> PanelResult<&[Group]> {
        self.grouped
            .as_ref()
            .and_then(|g| g.get(group_field))
            .map(|g| g.groups.as_slice())
            .ok_or_else(|| PanelError::MalformedResult {
                message: format!("no groups for field '{}'", group_field),
            })
    }

    pub fn docs(&self) -> PanelResult<&[Document]> {
        self.response
            .as_ref()
            .map(|r| r.docs.as_slice())
            .ok_or_else(|| PanelError::MalformedResult {
                message: "response carries no document list".to_string(),
            })
    }
}

/// Pulls the interesting part out of a backend error message: the text of
/// the first `nested: ...;` clause when there is one, the whole message
/// otherwise.
pub fn parse_error(msg: &str) -> String {
    const MARKER: &str = "nested: ";
    if let Some(start) = msg.find(MARKER) {
        let rest = &msg[start + MARKER.len()..];
        if let Some(end) = rest.find(';') {
            return rest[..end].to_string();
        }
    }
    msg.to_string()
}

/// Epoch milliseconds from a numeric or date-string field.
///
/// Floats are truncated; non-finite floats and floats outside the `i64`
/// range are rejected rather than saturated.
pub fn timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_millis)),
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

fn float_millis(f: f64) -> Option<i64> {
    // 2^63: the first float past i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Date formats are tried before plain integers. A bare four-digit string is
/// a year; any other integer string is epoch milliseconds.
fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }
    let date = if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    };
    if let Some(naive) = date.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
    }
    s.parse::<i64>().ok()
}

/// Numeric value of a document field. Missing or non-numeric fields count
/// as zero.
pub fn numeric_value(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

pub fn group_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
