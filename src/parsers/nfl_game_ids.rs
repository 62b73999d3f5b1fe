//! NFL weekly schedule extractor. The RapidAPI schedule endpoint returns
//! `{items: [{eventid, ...}]}`; the event ids drive the boxscore fetch loop.

use serde_json::Value;

use crate::models::GameIdList;
use crate::parsers::common::{get_list, require_fields, ParserError};

/// Pull the game ids for one (year, week) out of a schedule document.
/// Items without an eventid are skipped with a warning, not fatal.
pub fn extract(data: &Value, year: i32, week: i32) -> Result<GameIdList, ParserError> {
    require_fields(data, &["items"], "NFL schedule")?;

    let mut game_ids = Vec::new();
    for (index, item) in get_list(data, "items").iter().enumerate() {
        let event_id = match item.get("eventid") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        if event_id.is_empty() {
            tracing::warn!(index, "schedule item missing eventid, skipped");
            continue;
        }
        game_ids.push(event_id);
    }

    tracing::info!(year, week, games = game_ids.len(), "parsed weekly schedule");
    Ok(GameIdList { week, year, game_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_event_ids_and_skips_blanks() {
        let data = json!({
            "items": [
                {"eventid": "401547403"},
                {"eventid": 401547404},
                {"name": "no id here"},
                {"eventid": "  "}
            ]
        });
        let list = extract(&data, 2023, 5).unwrap();
        assert_eq!(list.year, 2023);
        assert_eq!(list.week, 5);
        assert_eq!(list.game_ids, vec!["401547403", "401547404"]);
    }

    #[test]
    fn missing_items_key_is_fatal() {
        assert!(extract(&json!({"events": []}), 2023, 1).is_err());
    }

    #[test]
    fn empty_item_list_yields_empty_result() {
        let list = extract(&json!({"items": []}), 2024, 18).unwrap();
        assert!(list.game_ids.is_empty());
    }
}
