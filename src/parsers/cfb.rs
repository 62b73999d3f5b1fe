//! College Football Data extractor. The payload is an array of games, each
//! with a `teams` list carrying per-category, per-stat athlete lines:
//! `teams[].statistics[].types[].athletes[]`.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{Extraction, League, PlayerRecord, Position, Source};
use crate::parsers::common::{
    convert_stat_json, get_list, parse_completions_attempts, ParserError,
};
use crate::parsers::metadata;
use crate::parsers::position::{self, StatProfile};

/// One athlete's accumulating line within a game, keyed below by
/// (player, team, game_id) so stats from several categories land on the
/// same record.
#[derive(Debug, Default)]
struct PendingRecord {
    opponent: String,
    week: Option<i32>,
    game_time: Option<String>,
    categories: Vec<String>,
    passing_yards: Option<i64>,
    completions: Option<i64>,
    attempts: Option<i64>,
    passing_touchdowns: Option<i64>,
    interceptions: Option<i64>,
    receiving_yards: Option<i64>,
    receptions: Option<i64>,
    receiving_touchdowns: Option<i64>,
    longest_reception: Option<i64>,
    rushing_yards: Option<i64>,
    rushing_attempts: Option<i64>,
    rushing_touchdowns: Option<i64>,
}

impl PendingRecord {
    fn note_category(&mut self, category: &str) {
        if !self.categories.iter().any(|c| c == category) {
            self.categories.push(category.to_string());
        }
    }

    fn apply_stat(&mut self, category: &str, stat_name: &str, raw: &Value) {
        let value = convert_stat_json(raw);
        let as_int = value.as_ref().and_then(|v| v.as_int());

        match (category, stat_name) {
            ("passing", "YDS") => self.passing_yards = as_int,
            ("passing", "C/ATT") => {
                if let Some(text) = raw.as_str() {
                    if let Some((c, a)) = parse_completions_attempts(text) {
                        self.completions = Some(c);
                        self.attempts = Some(a);
                    }
                }
            }
            ("passing", "TD") => self.passing_touchdowns = as_int,
            ("passing", "INT") => self.interceptions = as_int,
            ("receiving", "YDS") => self.receiving_yards = as_int,
            ("receiving", "REC") => self.receptions = as_int,
            ("receiving", "TD") => self.receiving_touchdowns = as_int,
            ("receiving", "LONG") => self.longest_reception = as_int,
            ("rushing", "YDS") => self.rushing_yards = as_int,
            ("rushing", "CAR") => self.rushing_attempts = as_int,
            ("rushing", "TD") => self.rushing_touchdowns = as_int,
            _ => {}
        }
    }

    /// Primary category for position classification: passing beats
    /// receiving beats rushing when an athlete appears in several.
    fn primary_category(&self) -> &str {
        for preferred in ["passing", "receiving", "rushing"] {
            if self.categories.iter().any(|c| c == preferred) {
                return preferred;
            }
        }
        self.categories.first().map_or("", String::as_str)
    }
}

fn str_field<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

/// Game ids arrive as numbers or strings depending on endpoint version.
fn id_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract per-game player stat records from one CFB games document.
pub fn extract(data: &Value, default_year: i32) -> Result<Extraction, ParserError> {
    let games = data.as_array().ok_or_else(|| ParserError::UnexpectedShape {
        context: "CFB stats".to_string(),
        expected: "a top-level array of games".to_string(),
    })?;

    let mut extraction = Extraction::default();
    let mut pending: HashMap<(String, String, String), PendingRecord> = HashMap::new();

    for game in games {
        extraction.processed += 1;

        let game_id = match id_field(game, "id") {
            Some(id) => id,
            None => {
                extraction.errors.push("game without an id, skipped".to_string());
                continue;
            }
        };
        let week = game.get("week").and_then(Value::as_i64).map(|w| w as i32);
        let game_time = str_field(game, "start_time").map(str::to_string);

        let teams = get_list(game, "teams");
        for team in teams {
            let team_name = str_field(team, "school").unwrap_or("Unknown Team");
            let opponent = teams
                .iter()
                .filter_map(|other| str_field(other, "school"))
                .find(|school| *school != team_name)
                .unwrap_or("Unknown Opponent");

            for category in get_list(team, "statistics") {
                let category_name = str_field(category, "name").unwrap_or("").to_lowercase();
                for stat_type in get_list(category, "types") {
                    let stat_name = str_field(stat_type, "name").unwrap_or("");
                    for athlete in get_list(stat_type, "athletes") {
                        let player_name = match str_field(athlete, "name") {
                            Some(name) => name,
                            None => {
                                extraction
                                    .errors
                                    .push(format!("athlete without a name in game {game_id}"));
                                continue;
                            }
                        };
                        let raw_stat = athlete.get("stat").cloned().unwrap_or(Value::Null);

                        let key = (
                            player_name.to_string(),
                            team_name.to_string(),
                            game_id.clone(),
                        );
                        let record = pending.entry(key).or_insert_with(|| PendingRecord {
                            opponent: opponent.to_string(),
                            week,
                            game_time: game_time.clone(),
                            ..Default::default()
                        });
                        record.note_category(&category_name);
                        record.apply_stat(&category_name, stat_name, &raw_stat);
                    }
                }
            }
        }
    }

    // Second pass: classify, gate, enrich.
    let mut entries: Vec<_> = pending.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for ((player_name, team, game_id), p) in entries {
        let category = p.primary_category().to_string();
        let pos = position::classify(
            &category,
            &player_name,
            StatProfile {
                receptions: p.receptions,
                receiving_yards: p.receiving_yards,
            },
        );
        if pos == Position::Unk {
            extraction
                .errors
                .push(format!("could not classify position for \"{player_name}\""));
            continue;
        }

        let mut record = PlayerRecord::new(
            &player_name,
            &team,
            &p.opponent,
            pos,
            &category,
            League::College,
            Source::CollegeFootballData,
        );
        record.game_id = Some(game_id);
        record.week = p.week;
        record.game_time = p.game_time;
        record.passing_yards = p.passing_yards;
        record.completions = p.completions;
        record.attempts = p.attempts;
        record.passing_touchdowns = p.passing_touchdowns;
        record.interceptions = p.interceptions;
        record.receiving_yards = p.receiving_yards;
        record.receptions = p.receptions;
        record.receiving_touchdowns = p.receiving_touchdowns;
        record.longest_reception = p.longest_reception;
        record.rushing_yards = p.rushing_yards;
        record.rushing_attempts = p.rushing_attempts;
        record.rushing_touchdowns = p.rushing_touchdowns;

        if !record.has_meaningful_stats() {
            extraction.errors.push(format!(
                "\"{}\" ({}) carries no meaningful {} stats",
                record.player_name, record.team, record.stat_type
            ));
            continue;
        }

        match metadata::enrich(record, default_year) {
            Ok(enriched) => extraction.records.push(enriched),
            Err(reason) => extraction.errors.push(reason.to_string()),
        }
    }

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_team_game() -> Value {
        json!([
            {
                "id": 401520123,
                "week": 3,
                "start_time": "2023-09-16T19:30:00Z",
                "teams": [
                    {
                        "school": "Georgia",
                        "statistics": [
                            {
                                "name": "passing",
                                "types": [
                                    {
                                        "name": "YDS",
                                        "athletes": [
                                            {"id": "a1", "name": "Carson Beck", "stat": "250"}
                                        ]
                                    },
                                    {
                                        "name": "C/ATT",
                                        "athletes": [
                                            {"id": "a1", "name": "Carson Beck", "stat": "24/35"}
                                        ]
                                    }
                                ]
                            }
                        ]
                    },
                    {
                        "school": "South Carolina",
                        "statistics": []
                    }
                ]
            }
        ])
    }

    #[test]
    fn qb_record_from_two_team_game() {
        let extraction = extract(&two_team_game(), 2020).unwrap();
        assert_eq!(extraction.records.len(), 1);

        let record = &extraction.records[0];
        assert_eq!(record.position, Position::Qb);
        assert_eq!(record.passing_yards, Some(250));
        assert_eq!(record.completions, Some(24));
        assert_eq!(record.attempts, Some(35));
        assert_eq!(record.team, "Georgia");
        assert_eq!(record.opponent, "South Carolina");
        assert_ne!(record.team, record.opponent);
        assert_eq!(record.league, League::College);
        assert_eq!(record.season, 2023);
        assert_eq!(record.week, Some(3));
    }

    #[test]
    fn categories_accumulate_onto_one_record() {
        let mut payload = two_team_game();
        payload[0]["teams"][0]["statistics"]
            .as_array_mut()
            .unwrap()
            .push(json!({
                "name": "rushing",
                "types": [
                    {"name": "YDS", "athletes": [{"id": "a1", "name": "Carson Beck", "stat": "32"}]}
                ]
            }));

        let extraction = extract(&payload, 2020).unwrap();
        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.position, Position::Qb);
        assert_eq!(record.rushing_yards, Some(32));
    }

    #[test]
    fn non_array_payload_is_fatal() {
        assert!(extract(&json!({"games": []}), 2023).is_err());
    }

    #[test]
    fn statless_athlete_is_dropped_with_error() {
        let payload = json!([
            {
                "id": 1,
                "week": 1,
                "start_time": "2023-09-02T16:00:00Z",
                "teams": [
                    {
                        "school": "Michigan",
                        "statistics": [
                            {
                                "name": "receiving",
                                "types": [
                                    {"name": "AVG", "athletes": [{"id": "a2", "name": "Roman Wilson", "stat": "11.5"}]}
                                ]
                            }
                        ]
                    },
                    {"school": "Ohio State", "statistics": []}
                ]
            }
        ]);
        let extraction = extract(&payload, 2023).unwrap();
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.errors.len(), 1);
    }
}
