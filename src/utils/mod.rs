//! Small shared helpers.

/// Full names the feeds are known to send in place of abbreviations.
/// Incomplete on purpose; unmapped names fall through to truncation below,
/// which can collide for schools sharing a prefix.
const TEAM_ABBREVIATIONS: &[(&str, &str)] = &[
    ("arizona cardinals", "ARI"),
    ("atlanta falcons", "ATL"),
    ("baltimore ravens", "BAL"),
    ("buffalo bills", "BUF"),
    ("carolina panthers", "CAR"),
    ("chicago bears", "CHI"),
    ("cincinnati bengals", "CIN"),
    ("cleveland browns", "CLE"),
    ("dallas cowboys", "DAL"),
    ("denver broncos", "DEN"),
    ("detroit lions", "DET"),
    ("green bay packers", "GB"),
    ("houston texans", "HOU"),
    ("indianapolis colts", "IND"),
    ("jacksonville jaguars", "JAX"),
    ("kansas city chiefs", "KC"),
    ("las vegas raiders", "LV"),
    ("los angeles chargers", "LAC"),
    ("los angeles rams", "LAR"),
    ("miami dolphins", "MIA"),
    ("minnesota vikings", "MIN"),
    ("new england patriots", "NE"),
    ("new orleans saints", "NO"),
    ("new york giants", "NYG"),
    ("new york jets", "NYJ"),
    ("philadelphia eagles", "PHI"),
    ("pittsburgh steelers", "PIT"),
    ("san francisco 49ers", "SF"),
    ("seattle seahawks", "SEA"),
    ("tampa bay buccaneers", "TB"),
    ("tennessee titans", "TEN"),
    ("washington commanders", "WAS"),
];

/// Map a team name to its abbreviation. Already-short names pass through
/// uppercased; unmapped long names are truncated to their first three
/// letters.
pub fn normalize_team_abbreviation(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.len() <= 4 {
        return trimmed.to_uppercase();
    }

    let lowered = trimmed.to_lowercase();
    if let Some((_, abbr)) = TEAM_ABBREVIATIONS.iter().find(|(full, _)| *full == lowered) {
        return (*abbr).to_string();
    }

    trimmed
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_pass_through() {
        assert_eq!(normalize_team_abbreviation("KC"), "KC");
        assert_eq!(normalize_team_abbreviation(" min "), "MIN");
    }

    #[test]
    fn known_full_names_map() {
        assert_eq!(normalize_team_abbreviation("Kansas City Chiefs"), "KC");
        assert_eq!(normalize_team_abbreviation("san francisco 49ers"), "SF");
    }

    #[test]
    fn unmapped_names_truncate() {
        assert_eq!(normalize_team_abbreviation("Georgia"), "GEO");
        assert_eq!(normalize_team_abbreviation("South Carolina"), "SOU");
    }
}
