//! NFL boxscore extractor. One document covers one game:
//! `boxscore.players[]` holds the two teams, each with per-category
//! statistics where `labels` indexes positionally into each athlete's
//! `stats` array.

use serde_json::Value;

use crate::models::{Extraction, League, PlayerRecord, Position, Source};
use crate::parsers::common::{
    convert_stat_value, get_list, get_nested_str, parse_completions_attempts, parse_sacks_field,
    require_fields, ParserError,
};
use crate::parsers::metadata;
use crate::parsers::position::{self, StatProfile};

/// Categories we extract; everything else (defense, kicking, returns) is
/// skipped.
const TRACKED_CATEGORIES: &[&str] = &["passing", "receiving", "rushing"];

fn stat_at<'a>(labels: &[&'a str], stats: &'a [Value], label: &str) -> Option<&'a str> {
    let index = labels.iter().position(|l| *l == label)?;
    stats.get(index).and_then(Value::as_str).map(str::trim)
}

fn int_stat(labels: &[&str], stats: &[Value], label: &str) -> Option<i64> {
    stat_at(labels, stats, label).and_then(|raw| convert_stat_value(raw).as_int())
}

fn apply_passing(record: &mut PlayerRecord, labels: &[&str], stats: &[Value]) {
    record.passing_yards = int_stat(labels, stats, "YDS");
    record.passing_touchdowns = int_stat(labels, stats, "TD");
    record.interceptions = int_stat(labels, stats, "INT");
    if let Some((completions, attempts)) =
        stat_at(labels, stats, "C/ATT").and_then(parse_completions_attempts)
    {
        record.completions = Some(completions);
        record.attempts = Some(attempts);
    }
    if let Some((sacks, yards_lost)) = stat_at(labels, stats, "SACKS").and_then(parse_sacks_field) {
        record.sacks = Some(sacks);
        record.sack_yards_lost = Some(yards_lost);
    }
}

fn apply_receiving(record: &mut PlayerRecord, labels: &[&str], stats: &[Value]) {
    record.receiving_yards = int_stat(labels, stats, "YDS");
    record.receptions = int_stat(labels, stats, "REC");
    record.receiving_touchdowns = int_stat(labels, stats, "TD");
    record.longest_reception = int_stat(labels, stats, "LONG");
    record.targets = int_stat(labels, stats, "TGTS");
}

fn apply_rushing(record: &mut PlayerRecord, labels: &[&str], stats: &[Value]) {
    record.rushing_yards = int_stat(labels, stats, "YDS");
    record.rushing_attempts = int_stat(labels, stats, "CAR");
    record.rushing_touchdowns = int_stat(labels, stats, "TD");
}

/// Extract player stat records from one boxscore document. `game_id` comes
/// from the schedule extractor; `game_time` is threaded through from the
/// fetch layer when the API provides it.
pub fn extract(
    data: &Value,
    game_id: &str,
    game_time: Option<&str>,
    default_year: i32,
) -> Result<Extraction, ParserError> {
    require_fields(data, &["boxscore"], "NFL boxscore")?;
    let boxscore = &data["boxscore"];
    require_fields(boxscore, &["players"], "NFL boxscore.players")?;

    let teams = get_list(boxscore, "players");
    let mut extraction = Extraction::default();

    // Abbreviations of both sides; a document always carries exactly two
    // teams, anything else downgrades opponents to TBD.
    let abbreviations: Vec<&str> = teams
        .iter()
        .filter_map(|t| {
            get_nested_str(t, &["team", "abbreviation"])
                .or_else(|| get_nested_str(t, &["team", "name"]))
        })
        .collect();

    for team_entry in teams {
        let team = get_nested_str(team_entry, &["team", "abbreviation"])
            .or_else(|| get_nested_str(team_entry, &["team", "name"]))
            .unwrap_or("Unknown Team");
        let opponent = if abbreviations.len() == 2 {
            abbreviations
                .iter()
                .find(|a| **a != team)
                .copied()
                .unwrap_or("TBD")
        } else {
            "TBD"
        };

        for category in get_list(team_entry, "statistics") {
            let category_name = get_nested_str(category, &["name"])
                .unwrap_or("")
                .to_lowercase();
            if !TRACKED_CATEGORIES.contains(&category_name.as_str()) {
                continue;
            }

            let labels: Vec<&str> = get_list(category, "labels")
                .iter()
                .filter_map(Value::as_str)
                .collect();

            for athlete_entry in get_list(category, "athletes") {
                extraction.processed += 1;

                let player_name = match get_nested_str(athlete_entry, &["athlete", "displayName"])
                    .or_else(|| get_nested_str(athlete_entry, &["athlete", "name"]))
                {
                    Some(name) => name,
                    None => {
                        extraction
                            .errors
                            .push(format!("{category_name} athlete without a name in {game_id}"));
                        continue;
                    }
                };
                let stats = get_list(athlete_entry, "stats");
                if stats.is_empty() {
                    extraction
                        .errors
                        .push(format!("no stats for \"{player_name}\""));
                    continue;
                }

                let mut record = PlayerRecord::new(
                    player_name,
                    team,
                    opponent,
                    Position::Unk,
                    &category_name,
                    League::Nfl,
                    Source::RapidApi,
                );
                record.game_id = Some(game_id.to_string());
                record.game_time = game_time.map(str::to_string);

                match category_name.as_str() {
                    "passing" => apply_passing(&mut record, &labels, stats),
                    "receiving" => apply_receiving(&mut record, &labels, stats),
                    "rushing" => apply_rushing(&mut record, &labels, stats),
                    _ => {}
                }

                record.position = position::classify(
                    &category_name,
                    player_name,
                    StatProfile {
                        receptions: record.receptions,
                        receiving_yards: record.receiving_yards,
                    },
                );

                if !record.has_meaningful_stats() {
                    extraction.errors.push(format!(
                        "\"{player_name}\" carries no meaningful {category_name} stats"
                    ));
                    continue;
                }

                match metadata::enrich(record, default_year) {
                    Ok(enriched) => extraction.records.push(enriched),
                    Err(reason) => extraction.errors.push(reason.to_string()),
                }
            }
        }
    }

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_boxscore() -> Value {
        json!({
            "boxscore": {
                "players": [
                    {
                        "team": {"name": "Kansas City Chiefs", "abbreviation": "KC"},
                        "statistics": [
                            {
                                "name": "passing",
                                "labels": ["C/ATT", "YDS", "AVG", "TD", "INT", "SACKS", "RTG"],
                                "athletes": [
                                    {
                                        "athlete": {"id": "3139477", "displayName": "Patrick Mahomes"},
                                        "stats": ["24/35", "305", "8.7", "2", "1", "3-21", "104.2"]
                                    }
                                ]
                            },
                            {
                                "name": "receiving",
                                "labels": ["REC", "YDS", "AVG", "TD", "LONG", "TGTS"],
                                "athletes": [
                                    {
                                        "athlete": {"displayName": "Travis Kelce"},
                                        "stats": ["9", "108", "12.0", "1", "28", "11"]
                                    },
                                    {
                                        "athlete": {"displayName": "Isiah Pacheco"},
                                        "stats": ["2", "14", "7.0", "0", "9", "2"]
                                    }
                                ]
                            }
                        ]
                    },
                    {
                        "team": {"name": "Detroit Lions", "abbreviation": "DET"},
                        "statistics": [
                            {
                                "name": "defense",
                                "labels": ["TOT"],
                                "athletes": [
                                    {"athlete": {"displayName": "Aidan Hutchinson"}, "stats": ["7"]}
                                ]
                            }
                        ]
                    }
                ]
            }
        })
    }

    #[test]
    fn extracts_tracked_categories_only() {
        let extraction =
            extract(&sample_boxscore(), "401547403", Some("2023-09-07T20:20:00Z"), 2020).unwrap();
        assert_eq!(extraction.processed, 3);
        assert_eq!(extraction.records.len(), 3);

        let mahomes = &extraction.records[0];
        assert_eq!(mahomes.position, Position::Qb);
        assert_eq!(mahomes.passing_yards, Some(305));
        assert_eq!(mahomes.completions, Some(24));
        assert_eq!(mahomes.attempts, Some(35));
        assert_eq!(mahomes.sacks, Some(3));
        assert_eq!(mahomes.sack_yards_lost, Some(21));
        assert_eq!(mahomes.team, "KC");
        assert_eq!(mahomes.opponent, "DET");
        assert_eq!(mahomes.season, 2023);
    }

    #[test]
    fn receiving_volume_drives_position() {
        let extraction = extract(&sample_boxscore(), "401547403", None, 2023).unwrap();
        let kelce = extraction
            .records
            .iter()
            .find(|r| r.player_name == "Travis Kelce")
            .unwrap();
        assert_eq!(kelce.position, Position::Te);

        let pacheco = extraction
            .records
            .iter()
            .find(|r| r.player_name == "Isiah Pacheco")
            .unwrap();
        assert_eq!(pacheco.position, Position::Rb);
    }

    #[test]
    fn missing_boxscore_key_is_fatal() {
        assert!(extract(&json!({"gamepackage": {}}), "g", None, 2023).is_err());
    }

    #[test]
    fn single_team_document_gets_tbd_opponent() {
        let mut payload = sample_boxscore();
        payload["boxscore"]["players"].as_array_mut().unwrap().pop();
        let extraction = extract(&payload, "401547403", None, 2023).unwrap();
        assert!(extraction.records.iter().all(|r| r.opponent == "TBD"));
    }
}
