//! Position classification for sources with no authoritative position field.
//! Everything here is heuristic and tuned independently of extraction.

use crate::models::Position;

/// A receiving line at or below both of these is treated as a back catching
/// checkdowns rather than a true receiver.
const RB_MAX_RECEPTIONS: i64 = 2;
const RB_MAX_RECEIVING_YARDS: i64 = 30;

/// A receiving line at or above either of these is unambiguously a wideout.
const WR_MIN_RECEPTIONS: i64 = 8;
const WR_MIN_RECEIVING_YARDS: i64 = 100;

/// Generational suffixes skew toward WR in the mid-volume band. Observed to
/// reduce TE misclassifications in practice, nothing deeper than that.
const WR_NAME_SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv"];

/// Players whose usage profile defeats the volume heuristic.
const KNOWN_POSITIONS: &[(&str, Position)] = &[
    ("travis kelce", Position::Te),
    ("george kittle", Position::Te),
    ("mark andrews", Position::Te),
    ("t.j. hockenson", Position::Te),
    ("sam laporta", Position::Te),
    ("christian mccaffrey", Position::Rb),
    ("austin ekeler", Position::Rb),
    ("alvin kamara", Position::Rb),
    ("deebo samuel", Position::Wr),
];

/// Feature vector for one athlete's line within a statistical category.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatProfile {
    pub receptions: Option<i64>,
    pub receiving_yards: Option<i64>,
}

fn has_wr_suffix(name: &str) -> bool {
    name.rsplit(|c: char| c.is_whitespace() || c == ',')
        .next()
        .map(|last| WR_NAME_SUFFIXES.contains(&last.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn known_position(name: &str) -> Option<Position> {
    let normalized = name.trim().to_lowercase();
    KNOWN_POSITIONS
        .iter()
        .find(|(known, _)| *known == normalized)
        .map(|(_, pos)| *pos)
}

/// Classify an athlete from category name, volume stats, and name string.
/// Passing and rushing categories are unambiguous; receiving needs the
/// volume heuristic since RBs, WRs, and TEs all catch passes. The override
/// table applies only there, so a back throwing a trick-play pass still
/// classifies as a passer.
pub fn classify(category: &str, name: &str, profile: StatProfile) -> Position {
    match category.trim().to_lowercase().as_str() {
        "passing" => Position::Qb,
        "rushing" => Position::Rb,
        "receiving" => classify_receiver(name, profile),
        _ => Position::Unk,
    }
}

fn classify_receiver(name: &str, profile: StatProfile) -> Position {
    if let Some(pos) = known_position(name) {
        return pos;
    }

    let receptions = profile.receptions.unwrap_or(0);
    let yards = profile.receiving_yards.unwrap_or(0);

    if receptions <= RB_MAX_RECEPTIONS && yards <= RB_MAX_RECEIVING_YARDS {
        return Position::Rb;
    }
    if receptions >= WR_MIN_RECEPTIONS || yards >= WR_MIN_RECEIVING_YARDS {
        return Position::Wr;
    }
    if has_wr_suffix(name) {
        Position::Wr
    } else {
        Position::Te
    }
}
