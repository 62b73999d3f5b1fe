//! PrizePicks projections extractor. The payload is JSON:API style: a `data`
//! array of projection objects plus a flat `included` array of typed objects
//! (players, teams, markets) referenced by `(type, id)`.

use serde_json::Value;

use crate::models::{Extraction, League, PlayerRecord, Position, Source};
use crate::parsers::common::{first_some, get_list, get_nested_str, require_fields, ParserError};
use crate::parsers::metadata;

const COLLEGE_LEAGUE_ID: &str = "15";

/// Find an object in `included` by its JSON:API type and id.
fn find_included<'a>(included: &'a [Value], type_name: &str, id: &str) -> Option<&'a Value> {
    included.iter().find(|item| {
        item.get("type").and_then(Value::as_str) == Some(type_name)
            && item.get("id").and_then(Value::as_str) == Some(id)
    })
}

/// Resolve the player object a projection points at through its
/// `relationships.new_player` indirection.
fn resolve_player<'a>(projection: &Value, included: &'a [Value]) -> Option<&'a Value> {
    let player_id = get_nested_str(projection, &["relationships", "new_player", "data", "id"])?;
    find_included(included, "new_player", player_id)
}

fn resolve_team(projection: &Value, included: &[Value]) -> String {
    let team = resolve_player(projection, included).and_then(|player| {
        get_nested_str(player, &["attributes", "team"])
            .or_else(|| get_nested_str(player, &["attributes", "team_name"]))
    });
    team.map_or_else(|| "Unknown Team".to_string(), str::to_string)
}

fn resolve_position(projection: &Value, included: &[Value]) -> Position {
    resolve_player(projection, included)
        .and_then(|player| get_nested_str(player, &["attributes", "position"]))
        .map_or(Position::Unk, Position::parse)
}

/// Game time lives on the projection itself when present, else on the
/// referenced market object. Tried in that order.
fn resolve_game_time(projection: &Value, included: &[Value]) -> Option<String> {
    let from_projection =
        || get_nested_str(projection, &["attributes", "start_time"]).map(str::to_string);
    let from_market = || {
        let market_id = get_nested_str(projection, &["relationships", "market", "data", "id"])?;
        let market = find_included(included, "market", market_id)?;
        get_nested_str(market, &["attributes", "start_time"]).map(str::to_string)
    };
    first_some(&[&from_projection, &from_market])
}

fn resolve_player_name(projection: &Value, included: &[Value]) -> String {
    let name = resolve_player(projection, included).and_then(|player| {
        get_nested_str(player, &["attributes", "display_name"])
            .or_else(|| get_nested_str(player, &["attributes", "name"]))
    });
    name.map_or_else(|| "Unknown Player".to_string(), str::to_string)
}

/// Extract prop-line records from one projections document.
pub fn extract(data: &Value, default_year: i32) -> Result<Extraction, ParserError> {
    require_fields(data, &["data", "included"], "PrizePicks projections")?;

    let included = get_list(data, "included");
    let mut extraction = Extraction::default();

    for projection in get_list(data, "data") {
        extraction.processed += 1;

        let stat_type = get_nested_str(projection, &["attributes", "stat_type"])
            .unwrap_or("unknown")
            .to_string();
        // Line scores arrive as numbers or numeric strings.
        let line_score = projection
            .get("attributes")
            .and_then(|a| a.get("line_score"))
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            });
        let odds_type = get_nested_str(projection, &["attributes", "odds_type"])
            .unwrap_or("standard")
            .to_string();

        let player_name = resolve_player_name(projection, included);
        let team = resolve_team(projection, included);
        let position = resolve_position(projection, included);
        let game_time = resolve_game_time(projection, included);

        // The source carries no matchup data; opponent stays TBD and is
        // tolerated downstream for prop lines.
        let league = match get_nested_str(projection, &["relationships", "league", "data", "id"]) {
            Some(COLLEGE_LEAGUE_ID) => League::College,
            _ => League::Nfl,
        };

        let mut record = PlayerRecord::new(
            &player_name,
            &team,
            "TBD",
            position,
            &stat_type,
            league,
            Source::PrizePicks,
        );
        record.projection_id = projection
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);
        record.game_time = game_time;
        record.line_score = line_score;
        record.odds_type = Some(odds_type);

        if !record.has_meaningful_line() {
            extraction.errors.push(format!(
                "projection {} for \"{player_name}\" has no usable line",
                record.projection_id.as_deref().unwrap_or("?")
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

    fn sample_payload() -> Value {
        json!({
            "data": [
                {
                    "id": "proj-1",
                    "type": "projection",
                    "attributes": {
                        "stat_type": "Pass Yards",
                        "line_score": 265.5,
                        "odds_type": "standard",
                        "start_time": "2023-09-10T20:20:00Z"
                    },
                    "relationships": {
                        "new_player": {"data": {"type": "new_player", "id": "p-9"}},
                        "league": {"data": {"type": "league", "id": "9"}}
                    }
                },
                {
                    "id": "proj-2",
                    "type": "projection",
                    "attributes": {
                        "stat_type": "Receiving Yards",
                        "line_score": null
                    },
                    "relationships": {
                        "new_player": {"data": {"type": "new_player", "id": "p-9"}}
                    }
                }
            ],
            "included": [
                {
                    "type": "new_player",
                    "id": "p-9",
                    "attributes": {
                        "display_name": "Patrick Mahomes",
                        "team": "KC",
                        "position": "QB"
                    }
                }
            ]
        })
    }

    #[test]
    fn extracts_one_valid_projection() {
        let extraction = extract(&sample_payload(), 2023).unwrap();
        assert_eq!(extraction.processed, 2);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.errors.len(), 1);

        let record = &extraction.records[0];
        assert_eq!(record.player_name, "Patrick Mahomes");
        assert_eq!(record.team, "KC");
        assert_eq!(record.opponent, "TBD");
        assert_eq!(record.position, Position::Qb);
        assert_eq!(record.line_score, Some(265.5));
        assert_eq!(record.season, 2023);
        assert_eq!(record.league, League::Nfl);
        assert_eq!(record.player_id.len(), 16);
    }

    #[test]
    fn string_line_score_is_coerced() {
        let mut payload = sample_payload();
        payload["data"][0]["attributes"]["line_score"] = json!("285.5");
        let extraction = extract(&payload, 2023).unwrap();
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].line_score, Some(285.5));
    }

    #[test]
    fn college_league_id_maps_to_college() {
        let mut payload = sample_payload();
        payload["data"][0]["relationships"]["league"]["data"]["id"] = json!("15");
        let extraction = extract(&payload, 2023).unwrap();
        assert_eq!(extraction.records[0].league, League::College);
    }

    #[test]
    fn game_time_falls_back_to_market() {
        let mut payload = sample_payload();
        payload["data"][0]["attributes"]
            .as_object_mut()
            .unwrap()
            .remove("start_time");
        payload["data"][0]["relationships"]["market"] =
            json!({"data": {"type": "market", "id": "m-1"}});
        payload["included"].as_array_mut().unwrap().push(json!({
            "type": "market",
            "id": "m-1",
            "attributes": {"start_time": "2024-11-03T18:00:00Z"}
        }));

        let extraction = extract(&payload, 2020).unwrap();
        assert_eq!(extraction.records[0].season, 2024);
    }

    #[test]
    fn missing_stat_type_drops_the_projection() {
        let mut payload = sample_payload();
        payload["data"][0]["attributes"]
            .as_object_mut()
            .unwrap()
            .remove("stat_type");
        let extraction = extract(&payload, 2023).unwrap();
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.errors.len(), 2);
    }

    #[test]
    fn missing_top_level_keys_are_fatal() {
        let err = extract(&json!({"data": []}), 2023).unwrap_err();
        assert!(matches!(err, ParserError::DataStructure { .. }));
    }

    #[test]
    fn unresolvable_player_becomes_an_error_not_a_record() {
        let mut payload = sample_payload();
        payload["included"] = json!([]);
        let extraction = extract(&payload, 2023).unwrap();
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.errors.len(), 2);
    }
}
