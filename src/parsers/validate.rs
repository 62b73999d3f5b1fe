//! Record-level gating applied after enrichment. Per-record failures are
//! collected as strings on the extraction, never propagated to the caller.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::PlayerRecord;

/// Sentinel strings sources (and our own resolvers) use to signal missing
/// data. Matched against trimmed, lowercased field values. One shared table
/// for every extractor.
pub const PLACEHOLDER_VALUES: &[&str] = &[
    "unknown",
    "unk",
    "n/a",
    "na",
    "null",
    "none",
    "missing",
    "error",
    "failed",
    "invalid",
    "tbd",
    "unknown team",
    "unknown opponent",
    "unknown position",
    "unknown player",
    "placeholder",
    "default",
];

pub const SEASON_MIN: i32 = 2000;
pub const SEASON_MAX: i32 = 2030;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("placeholder value in critical field '{field}': \"{value}\"")]
    Placeholder { field: String, value: String },

    #[error("metadata validation failed: {0}")]
    Metadata(String),

    #[error("player identity unresolved for \"{player}\" ({team})")]
    IdentityUnresolved { player: String, team: String },
}

pub fn is_placeholder(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    normalized.is_empty() || PLACEHOLDER_VALUES.contains(&normalized.as_str())
}

/// Reject a record whose critical identity fields carry sentinel values.
/// Opponent is deliberately not critical: PrizePicks never supplies one and
/// those records are still worth persisting.
pub fn reject_placeholders(record: &PlayerRecord) -> Result<(), ValidationError> {
    let critical = [
        ("player_name", record.player_name.as_str()),
        ("team", record.team.as_str()),
        ("stat_type", record.stat_type.as_str()),
    ];
    for (field, value) in critical {
        if is_placeholder(value) {
            return Err(ValidationError::Placeholder {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Enforce presence and bounds on the standard metadata every persisted
/// record must carry.
pub fn check_metadata(record: &PlayerRecord) -> Result<(), ValidationError> {
    if record.player_id.is_empty() {
        return Err(ValidationError::Metadata("player_id is empty".to_string()));
    }
    if !(SEASON_MIN..=SEASON_MAX).contains(&record.season) {
        return Err(ValidationError::Metadata(format!(
            "season {} outside {}..={}",
            record.season, SEASON_MIN, SEASON_MAX
        )));
    }
    if record.player_id.len() != 16 || !record.player_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ValidationError::Metadata(format!(
            "player_id '{}' is not a 16-hex digest",
            record.player_id
        )));
    }
    Ok(())
}

/// Records with both sides of a matchup populated must name two different
/// teams. Sentinel opponents are exempt (they fail or pass elsewhere).
pub fn check_matchup(record: &PlayerRecord) -> Result<(), ValidationError> {
    if !is_placeholder(&record.opponent)
        && record.team.eq_ignore_ascii_case(&record.opponent)
    {
        return Err(ValidationError::Metadata(format!(
            "team and opponent are both '{}'",
            record.team
        )));
    }
    Ok(())
}

type Validator = fn(&PlayerRecord) -> Result<(), ValidationError>;

/// The post-enrichment pipeline, applied in order to every record. The first
/// failure wins and the record is dropped by the extractor.
pub const VALIDATORS: &[Validator] = &[reject_placeholders, check_metadata, check_matchup];

pub fn validate_record(record: &PlayerRecord) -> Result<(), ValidationError> {
    for validator in VALIDATORS {
        validator(record)?;
    }
    Ok(())
}

/// Batch quality overview: how many records carry at least one sentinel, and
/// per-field issue counts. Diagnostic only, never gates anything.
#[derive(Debug, Default)]
pub struct QualitySummary {
    pub total: usize,
    pub flagged: usize,
    pub field_issues: HashMap<String, usize>,
}

pub fn quality_summary(records: &[PlayerRecord]) -> QualitySummary {
    let mut summary = QualitySummary {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        let fields = [
            ("player_name", record.player_name.as_str()),
            ("team", record.team.as_str()),
            ("opponent", record.opponent.as_str()),
        ];
        let mut any = false;
        for (name, value) in fields {
            if is_placeholder(value) {
                any = true;
                *summary.field_issues.entry(name.to_string()).or_insert(0) += 1;
            }
        }
        if any {
            summary.flagged += 1;
        }
    }
    summary
}
