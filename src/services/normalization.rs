//! Coercion of loosely shaped model output into [`Trend`]s.
//!
//! Records are resolved through a synonym table and repaired where possible.
//! A record that cannot be repaired is dropped on its own; the rest of the
//! batch carries on.

use crate::domain::trend::{Impact, Quadrant, Ring, Trend};
use crate::services::error_handling::{GenerationError, LogHelper, NormalizationError};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const LABEL_FIELDS: &[&str] = &["label", "name"];
const SUMMARY_FIELDS: &[&str] = &["summary", "description"];
const QUADRANT_FIELDS: &[&str] = &["quadrant"];
const RING_FIELDS: &[&str] = &["ring", "timeline"];
const IMPACT_FIELDS: &[&str] = &["impact", "impact_level"];

const RING_SYNONYMS: &[(&str, Ring)] = &[
    ("short", Ring::NearTerm),
    ("short-term", Ring::NearTerm),
    ("medium", Ring::MidTerm),
    ("medium-term", Ring::MidTerm),
    ("long", Ring::LongTerm),
    ("long-term", Ring::LongTerm),
];

pub const MAX_LABEL_UNITS: usize = 50;
pub const MAX_SUMMARY_UNITS: usize = 150;
pub const MISSING_SUMMARY: &str = "No summary available";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)```(?:json)?\s*").unwrap());

/// Normalize one raw record. `index` is its position in the raw batch and
/// only feeds the placeholder label and error messages.
pub fn normalize(raw: &Value, index: usize) -> Result<Trend, NormalizationError> {
    let record = raw
        .as_object()
        .filter(|obj| is_recognizable(obj))
        .ok_or(NormalizationError::UnrecognizedShape { index })?;

    let label = match text_field(record, LABEL_FIELDS, index, "label")? {
        Some(label) => label.to_string(),
        None => format!("Trend {}", index + 1),
    };
    let summary = match text_field(record, SUMMARY_FIELDS, index, "summary")? {
        Some(summary) => summary.to_string(),
        None => MISSING_SUMMARY.to_string(),
    };

    let quadrant = first_present(record, QUADRANT_FIELDS)
        .and_then(Value::as_str)
        .and_then(Quadrant::parse)
        .unwrap_or_default();
    let ring = first_present(record, RING_FIELDS)
        .and_then(Value::as_str)
        .and_then(resolve_ring)
        .unwrap_or_default();
    let impact = first_present(record, IMPACT_FIELDS)
        .and_then(Value::as_str)
        .and_then(resolve_impact)
        .unwrap_or_default();

    Ok(Trend::new(
        truncate_utf16(&label, MAX_LABEL_UNITS),
        truncate_utf16(&summary, MAX_SUMMARY_UNITS),
        quadrant,
        ring,
        impact,
    ))
}

/// Normalize a whole batch, dropping records that fail.
///
/// An empty input, or one where every record was dropped, is a batch failure.
pub fn normalize_batch(records: &[Value]) -> Result<Vec<Trend>, GenerationError> {
    let trends: Vec<Trend> = records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match normalize(raw, index) {
            Ok(trend) => Some(trend),
            Err(e) => {
                LogHelper::log_normalization_skip(&e);
                None
            }
        })
        .collect();

    if trends.is_empty() {
        return Err(GenerationError::EmptyBatch {
            received: records.len(),
        });
    }
    Ok(trends)
}

/// Strict check used when verifying a credential: every canonical field
/// present with a canonical value.
pub fn validate_strict(raw: &Value, index: usize) -> Result<(), NormalizationError> {
    let record = raw
        .as_object()
        .ok_or(NormalizationError::UnrecognizedShape { index })?;

    for field in ["label", "quadrant", "ring", "impact", "summary"] {
        if first_present(record, &[field]).is_none() {
            return Err(NormalizationError::MissingField { index, field });
        }
    }

    let canonical = |field: &'static str, ok: fn(&str) -> bool| {
        let value = record.get(field).and_then(Value::as_str).unwrap_or_default();
        if ok(value) {
            Ok(())
        } else {
            Err(NormalizationError::UnknownValue {
                index,
                field,
                value: record.get(field).map(|v| v.to_string()).unwrap_or_default(),
            })
        }
    };
    canonical("quadrant", |v| Quadrant::parse(v).is_some())?;
    canonical("ring", |v| Ring::parse(v).is_some())?;
    canonical("impact", |v| Impact::parse(v).is_some())?;
    Ok(())
}

/// Pull the JSON array out of a model reply that may be wrapped in code
/// fences or surrounded by prose.
pub fn extract_json_array(content: &str) -> Result<Vec<Value>, GenerationError> {
    let cleaned = CODE_FENCE.replace_all(content, "");
    let cleaned = cleaned.trim();

    let (Some(first), Some(last)) = (cleaned.find('['), cleaned.rfind(']')) else {
        return Err(GenerationError::MalformedPayload {
            reason: "response does not contain a JSON array".to_string(),
        });
    };
    if last < first {
        return Err(GenerationError::MalformedPayload {
            reason: "response does not contain a JSON array".to_string(),
        });
    }

    match serde_json::from_str::<Value>(&cleaned[first..=last]) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(GenerationError::MalformedPayload {
            reason: "expected an array of trends".to_string(),
        }),
        Err(e) => Err(GenerationError::MalformedPayload {
            reason: format!("invalid JSON: {}", e),
        }),
    }
}

/// Truncate to at most `max_units` UTF-16 code units without splitting a
/// character.
pub fn truncate_utf16(text: &str, max_units: usize) -> String {
    let mut units = 0;
    let mut end = 0;
    for (offset, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            break;
        }
        end = offset + ch.len_utf8();
    }
    text[..end].to_string()
}

fn resolve_ring(value: &str) -> Option<Ring> {
    let value = value.trim();
    Ring::ALL
        .into_iter()
        .find(|ring| ring.as_str().eq_ignore_ascii_case(value))
        .or_else(|| {
            RING_SYNONYMS
                .iter()
                .find(|(synonym, _)| synonym.eq_ignore_ascii_case(value))
                .map(|(_, ring)| *ring)
        })
}

fn resolve_impact(value: &str) -> Option<Impact> {
    let value = value.trim();
    Impact::ALL
        .into_iter()
        .find(|impact| impact.as_str().eq_ignore_ascii_case(value))
}

/// A value counts as present when it isn't null, false, zero or "".
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_present<'a>(record: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| record.get(*field))
        .find(|value| is_present(value))
}

fn text_field<'a>(
    record: &'a Map<String, Value>,
    fields: &[&str],
    index: usize,
    field: &'static str,
) -> Result<Option<&'a str>, NormalizationError> {
    match first_present(record, fields) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(NormalizationError::InvalidField { index, field }),
    }
}

fn is_recognizable(record: &Map<String, Value>) -> bool {
    [LABEL_FIELDS, SUMMARY_FIELDS, QUADRANT_FIELDS, RING_FIELDS, IMPACT_FIELDS]
        .iter()
        .flat_map(|fields| fields.iter())
        .any(|field| record.contains_key(*field))
}
