/// The clubs the match classifier was trained on, in one-hot column order.
///
/// Adding a club means retraining the match model and extending this list;
/// the feature builder picks it up from here.
pub const TEAMS: [&str; 21] = [
    "Arsenal",
    "Aston Villa",
    "Bournemouth",
    "Brentford",
    "Brighton",
    "Burnley",
    "Chelsea",
    "Crystal Palace",
    "Everton",
    "Fulham",
    "Leeds",
    "Liverpool",
    "Luton",
    "Man City",
    "Man United",
    "Newcastle",
    "Nott'm For",
    "Sunderland",
    "Tottenham",
    "West Ham",
    "Wolves",
];

/// Below this Jaro-Winkler score a name is not worth suggesting.
const SUGGESTION_THRESHOLD: f64 = 0.75;

pub fn is_known_team(name: &str) -> bool {
    TEAMS.contains(&name)
}

/// Closest known team to a misspelt name, if any is close enough.
pub fn suggest_team(name: &str) -> Option<&'static str> {
    let needle = name.trim().to_lowercase();
    TEAMS
        .iter()
        .map(|team| (*team, strsim::jaro_winkler(&needle, &team.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(team, _)| team)
}

/// Logo file name for a team: the name with spaces removed, except for
/// Nottingham Forest whose apostrophe is dropped too.
pub fn logo_file_name(team: &str) -> Option<String> {
    if !is_known_team(team) {
        return None;
    }
    let stem = match team {
        "Nott'm For" => "NottmFor".to_string(),
        other => other.replace(' ', ""),
    };
    Some(format!("{}.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_list_is_unique() {
        for (i, team) in TEAMS.iter().enumerate() {
            assert!(!TEAMS[i + 1..].contains(team), "duplicate team {}", team);
        }
    }

    #[test]
    fn test_logo_file_names() {
        assert_eq!(logo_file_name("Arsenal").as_deref(), Some("Arsenal.png"));
        assert_eq!(logo_file_name("Aston Villa").as_deref(), Some("AstonVilla.png"));
        assert_eq!(logo_file_name("Man United").as_deref(), Some("ManUnited.png"));
        assert_eq!(logo_file_name("Nott'm For").as_deref(), Some("NottmFor.png"));
        assert_eq!(logo_file_name("Real Madrid"), None);
    }

    #[test]
    fn test_suggest_team() {
        assert_eq!(suggest_team("Chelsae"), Some("Chelsea"));
        assert_eq!(suggest_team("man city"), Some("Man City"));
        assert_eq!(suggest_team("zzzzzz"), None);
    }
}
