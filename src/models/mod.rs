use serde::{Deserialize, Serialize};
use std::fmt;

/// Player position, inferred from stat categories when the source carries no
/// authoritative field. `Unk` is the explicit fallback, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Qb,
    Wr,
    Rb,
    Te,
    Unk,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Wr => "WR",
            Position::Rb => "RB",
            Position::Te => "TE",
            Position::Unk => "UNK",
        }
    }

    /// Parse a source-provided position label ("QB", "qb", "Quarterback"…).
    pub fn parse(label: &str) -> Position {
        match label.trim().to_uppercase().as_str() {
            "QB" | "QUARTERBACK" => Position::Qb,
            "WR" | "WIDE RECEIVER" => Position::Wr,
            "RB" | "RUNNING BACK" | "FB" => Position::Rb,
            "TE" | "TIGHT END" => Position::Te,
            _ => Position::Unk,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
    Nfl,
    College,
}

impl League {
    pub fn as_str(&self) -> &'static str {
        match self {
            League::Nfl => "nfl",
            League::College => "college",
        }
    }

    pub fn parse(label: &str) -> Option<League> {
        match label.trim().to_lowercase().as_str() {
            "nfl" => Some(League::Nfl),
            "college" | "cfb" | "ncaa" => Some(League::College),
            _ => None,
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream data vendor a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    PrizePicks,
    CollegeFootballData,
    RapidApi,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::PrizePicks => "PrizePicks",
            Source::CollegeFootballData => "CollegeFootballData",
            Source::RapidApi => "RapidAPI",
        }
    }

}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of coercing a raw stat string. Integer first, float when a decimal
/// point is present, text for compound formats like "24/35" or "4-11" that a
/// dedicated parser splits later.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// The canonical normalized output unit. Built by an extractor, enriched with
/// metadata, validated, then handed to the database routing layer. Never
/// mutated after emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_name: String,
    pub team: String,
    pub opponent: String,
    pub position: Position,
    pub stat_type: String,
    pub league: League,
    pub season: i32,
    pub source: Source,
    pub player_id: String,

    pub game_id: Option<String>,
    pub week: Option<i32>,
    pub game_time: Option<String>,
    pub projection_id: Option<String>,

    // Prop-line fields (PrizePicks only)
    pub line_score: Option<f64>,
    pub odds_type: Option<String>,

    // Passing
    pub passing_yards: Option<i64>,
    pub completions: Option<i64>,
    pub attempts: Option<i64>,
    pub passing_touchdowns: Option<i64>,
    pub interceptions: Option<i64>,
    pub sacks: Option<i64>,
    pub sack_yards_lost: Option<i64>,

    // Receiving
    pub receiving_yards: Option<i64>,
    pub receptions: Option<i64>,
    pub targets: Option<i64>,
    pub receiving_touchdowns: Option<i64>,
    pub longest_reception: Option<i64>,

    // Rushing
    pub rushing_yards: Option<i64>,
    pub rushing_attempts: Option<i64>,
    pub rushing_touchdowns: Option<i64>,
}

impl PlayerRecord {
    /// A blank record with the mandatory identity/metadata fields; callers
    /// fill the stat fields they extracted. Season and player_id are set
    /// later by enrichment.
    pub fn new(
        player_name: impl Into<String>,
        team: impl Into<String>,
        opponent: impl Into<String>,
        position: Position,
        stat_type: impl Into<String>,
        league: League,
        source: Source,
    ) -> Self {
        PlayerRecord {
            player_name: player_name.into(),
            team: team.into(),
            opponent: opponent.into(),
            position,
            stat_type: stat_type.into(),
            league,
            season: 0,
            source,
            player_id: String::new(),
            game_id: None,
            week: None,
            game_time: None,
            projection_id: None,
            line_score: None,
            odds_type: None,
            passing_yards: None,
            completions: None,
            attempts: None,
            passing_touchdowns: None,
            interceptions: None,
            sacks: None,
            sack_yards_lost: None,
            receiving_yards: None,
            receptions: None,
            targets: None,
            receiving_touchdowns: None,
            longest_reception: None,
            rushing_yards: None,
            rushing_attempts: None,
            rushing_touchdowns: None,
        }
    }

    /// A record is worth persisting only when it carries at least one
    /// meaningful stat for its position.
    pub fn has_meaningful_stats(&self) -> bool {
        match self.position {
            Position::Qb => {
                self.passing_yards.is_some()
                    || self.completions.is_some()
                    || self.passing_touchdowns.is_some()
            }
            Position::Wr | Position::Te => {
                self.receiving_yards.is_some()
                    || self.receptions.is_some()
                    || self.receiving_touchdowns.is_some()
            }
            Position::Rb => {
                self.receiving_yards.is_some()
                    || self.receptions.is_some()
                    || self.receiving_touchdowns.is_some()
                    || self.rushing_yards.is_some()
                    || self.rushing_attempts.is_some()
            }
            Position::Unk => false,
        }
    }

    /// Prop-line records are gated on the line itself rather than game stats.
    pub fn has_meaningful_line(&self) -> bool {
        self.line_score.is_some()
    }
}

/// Output of the NFL game-id extractor; drives the per-game boxscore fetch
/// loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameIdList {
    pub week: i32,
    pub year: i32,
    pub game_ids: Vec<String>,
}

/// What an extractor hands back: the records that survived validation plus
/// one error string per record that did not. Structural failures of the whole
/// document are a `ParserError` instead.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<PlayerRecord>,
    pub errors: Vec<String>,
    pub processed: usize,
}

impl Extraction {
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (self.records.len() as f64 / self.processed as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_parse_handles_case_and_long_forms() {
        assert_eq!(Position::parse("qb"), Position::Qb);
        assert_eq!(Position::parse("Wide Receiver"), Position::Wr);
        assert_eq!(Position::parse("TE"), Position::Te);
        assert_eq!(Position::parse("P"), Position::Unk);
    }

    #[test]
    fn meaningful_stats_gate_by_position() {
        let mut qb = PlayerRecord::new(
            "Test QB",
            "KC",
            "DET",
            Position::Qb,
            "passing",
            League::Nfl,
            Source::RapidApi,
        );
        assert!(!qb.has_meaningful_stats());
        qb.passing_yards = Some(295);
        assert!(qb.has_meaningful_stats());

        let mut rb = PlayerRecord::new(
            "Test RB",
            "KC",
            "DET",
            Position::Rb,
            "rushing",
            League::Nfl,
            Source::RapidApi,
        );
        rb.rushing_yards = Some(80);
        assert!(rb.has_meaningful_stats());

        // Receiving stats never qualify a QB record.
        let mut qb2 = qb.clone();
        qb2.passing_yards = None;
        qb2.receiving_yards = Some(12);
        assert!(!qb2.has_meaningful_stats());
    }

    #[test]
    fn unk_position_never_meaningful() {
        let mut rec = PlayerRecord::new(
            "Someone",
            "KC",
            "DET",
            Position::Unk,
            "receiving",
            League::Nfl,
            Source::RapidApi,
        );
        rec.receiving_yards = Some(50);
        assert!(!rec.has_meaningful_stats());
    }
}
