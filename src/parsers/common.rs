//! Shared helpers for the per-source extractors: JSON traversal, the error
//! taxonomy, stat-value coercion, and compound-format parsers.

use serde_json::Value;
use thiserror::Error;

use crate::models::{Extraction, StatValue};
use crate::parsers::validate;

/// Structural failures are fatal for the current document and propagate to
/// the caller. Per-record problems never surface here; they become entries
/// in the extraction's error list instead.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required fields in {context}: {fields:?}")]
    DataStructure { context: String, fields: Vec<String> },

    #[error("{context}: expected {expected}")]
    UnexpectedShape { context: String, expected: String },
}

/// Validate that required top-level keys exist on an object.
pub fn require_fields(data: &Value, required: &[&str], context: &str) -> Result<(), ParserError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|k| data.get(**k).is_none())
        .map(|k| k.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ParserError::DataStructure {
            context: context.to_string(),
            fields: missing,
        })
    }
}

/// Walk a key path into nested objects, `None` when any hop is absent.
pub fn get_nested<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut current = data;
    for key in keys {
        current = current.get(key)?;
    }
    Some(current)
}

/// Nested string lookup with trimming; empty strings count as absent.
pub fn get_nested_str<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a str> {
    get_nested(data, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A list value under `key`, or the empty slice when missing or not a list.
pub fn get_list<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

/// Try an ordered list of accessors and return the first non-null result.
/// Replaces nested "try key A, else key B, else default" conditionals with an
/// explicit priority order.
pub fn first_some<T>(accessors: &[&dyn Fn() -> Option<T>]) -> Option<T> {
    accessors.iter().find_map(|f| f())
}

/// Coerce a raw stat value to its natural type: integer first, float when a
/// decimal point is present, text otherwise. Compound formats ("24/35",
/// "4-11") stay text for the dedicated splitters below.
pub fn convert_stat_value(raw: &str) -> StatValue {
    let trimmed = raw.trim();
    if !trimmed.contains('.') && !trimmed.contains('/') {
        if let Ok(n) = trimmed.parse::<i64>() {
            return StatValue::Int(n);
        }
    }
    if trimmed.contains('.') {
        if let Ok(f) = trimmed.parse::<f64>() {
            return StatValue::Float(f);
        }
    }
    StatValue::Text(trimmed.to_string())
}

/// Coerce a JSON stat value (sources mix strings and numbers freely).
pub fn convert_stat_json(value: &Value) -> Option<StatValue> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(convert_stat_value(s)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(StatValue::Int(i))
            } else {
                n.as_f64().map(StatValue::Float)
            }
        }
        _ => None,
    }
}

impl StatValue {
    /// Integer view, truncating floats; `None` for text.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StatValue::Int(n) => Some(*n),
            StatValue::Float(f) => Some(*f as i64),
            StatValue::Text(_) => None,
        }
    }
}

/// Split a "completions/attempts" compound like "24/35" into its two numeric
/// halves. Anything that does not split cleanly is `None`.
pub fn parse_completions_attempts(raw: &str) -> Option<(i64, i64)> {
    let (c, a) = raw.trim().split_once('/')?;
    Some((c.trim().parse().ok()?, a.trim().parse().ok()?))
}

/// Split the boxscore "SACKS-YDSLOST" compound: "4-11" means 4 sacks for 11
/// yards lost. A bare number means zero yards lost ("0" -> (0, 0)).
pub fn parse_sacks_field(raw: &str) -> Option<(i64, i64)> {
    let trimmed = raw.trim();
    match trimmed.split_once('-') {
        Some((sacks, yards)) => {
            Some((sacks.trim().parse().ok()?, yards.trim().parse().ok()?))
        }
        None => {
            let sacks = trimmed.parse().ok()?;
            Some((sacks, 0))
        }
    }
}

/// Log the standard end-of-extraction summary every extractor emits
/// regardless of success.
pub fn log_extraction_summary(parser_name: &str, extraction: &Extraction) {
    tracing::info!(
        parser = parser_name,
        processed = extraction.processed,
        parsed = extraction.records.len(),
        success_rate = format!("{:.1}%", extraction.success_rate()),
        errors = extraction.errors.len(),
        "extraction complete"
    );
    let quality = validate::quality_summary(&extraction.records);
    if quality.flagged > 0 {
        tracing::warn!(
            parser = parser_name,
            flagged = quality.flagged,
            issues = ?quality.field_issues,
            "records with sentinel fields survived validation"
        );
    }
    for error in extraction.errors.iter().take(3) {
        tracing::warn!(parser = parser_name, "{}", error);
    }
    if extraction.errors.len() > 3 {
        tracing::warn!(
            parser = parser_name,
            "... and {} more errors",
            extraction.errors.len() - 3
        );
    }
}
