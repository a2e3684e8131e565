//! Feature vector assembly.
//!
//! The goal model consumes a positional vector whose order is pinned by
//! [`GoalLayout`]. The match and league models consume a named record that is
//! reindexed against the model's expected columns by [`reconcile`].

use crate::models::{LeagueStatRecord, MatchStatRecord, PlayerStatRecord, TEAMS};

/// Value written for any expected column the record does not carry.
pub const FILL_VALUE: f64 = 0.0;

/// An insertion-ordered mapping of feature name to value.
///
/// Re-inserting an existing name overwrites the value in place and keeps the
/// original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    entries: Vec<(String, f64)>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Values in natural (insertion) order.
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureRecord {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut record = FeatureRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Reindexes `record` against `expected_columns`.
///
/// Position `i` of the result holds the value of `expected_columns[i]`, or
/// [`FILL_VALUE`] when the record lacks it. Record columns outside the
/// expected list are dropped.
pub fn reconcile(record: &FeatureRecord, expected_columns: &[String]) -> Vec<f64> {
    expected_columns
        .iter()
        .map(|column| record.get(column).unwrap_or(FILL_VALUE))
        .collect()
}

/// Like [`reconcile`] but keeps the column names.
pub fn reconcile_record(record: &FeatureRecord, expected_columns: &[String]) -> FeatureRecord {
    expected_columns
        .iter()
        .map(|column| (column.clone(), record.get(column).unwrap_or(FILL_VALUE)))
        .collect()
}

/// Builds the model input: reconciled when a schema is known, otherwise the
/// record's natural order.
pub fn assemble(record: &FeatureRecord, expected_columns: Option<&[String]>) -> Vec<f64> {
    match expected_columns {
        Some(columns) => reconcile(record, columns),
        None => {
            tracing::warn!(
                "No expected-column schema available, using natural order of {} features",
                record.len()
            );
            record.values()
        }
    }
}

/// Column layouts the goal regressor has been trained with.
///
/// The positional order is a contract with the trained artifact. Changing it
/// without retraining silently corrupts predictions, so both layouts are
/// pinned by name and checked against any schema the artifact declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalLayout {
    /// Includes the penalty / non-penalty split.
    Full,
    /// Omits the penalty / non-penalty split.
    Compact,
}

const POSITION_COLUMNS: [&str; 4] = [
    "Position_Attacking Midfielder",
    "Position_Forward",
    "Position_Midfielder",
    "Position_Winger",
];

impl GoalLayout {
    pub fn width(&self) -> usize {
        match self {
            GoalLayout::Full => 12,
            GoalLayout::Compact => 10,
        }
    }

    pub fn for_width(width: usize) -> Option<Self> {
        [GoalLayout::Full, GoalLayout::Compact]
            .into_iter()
            .find(|layout| layout.width() == width)
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec!["Age", "Appearances", "Goals_prev_season"];
        if *self == GoalLayout::Full {
            names.extend(["Penalty_Goals", "Non_Penalty_Goals"]);
        }
        names.extend(["Goals_per_90", "Big_6_Club_Feature", "League_Goals_per_Match"]);
        names.extend(POSITION_COLUMNS);
        names.into_iter().map(String::from).collect()
    }

    pub fn build(&self, player: &PlayerStatRecord) -> Vec<f64> {
        let mut vector = vec![
            player.age as f64,
            player.appearances as f64,
            player.goals_prev_season as f64,
        ];
        if *self == GoalLayout::Full {
            vector.push(player.penalty_goals as f64);
            vector.push(player.non_penalty_goals as f64);
        }
        vector.push(player.goals_per_90);
        vector.push(player.big_6_club as f64);
        vector.push(player.league_goals_per_match);
        vector.extend(player.position.one_hot());
        vector
    }
}

pub fn home_flag(team: &str) -> String {
    format!("Home_{}", team)
}

pub fn away_flag(team: &str) -> String {
    format!("Away_{}", team)
}

/// Named match record: the fourteen match counters followed by one
/// `Home_<team>` and one `Away_<team>` indicator per known team.
pub fn match_record(stats: &MatchStatRecord) -> FeatureRecord {
    let mut record: FeatureRecord = [
        ("HTHG", stats.home_half_time_goals),
        ("HTAG", stats.away_half_time_goals),
        ("HomeShots", stats.home_shots),
        ("AwayShots", stats.away_shots),
        ("HomeShotsOnTarget", stats.home_shots_on_target),
        ("AwayShotsOnTarget", stats.away_shots_on_target),
        ("HomeCorners", stats.home_corners),
        ("AwayCorners", stats.away_corners),
        ("HomeFouls", stats.home_fouls),
        ("AwayFouls", stats.away_fouls),
        ("HomeYellowCards", stats.home_yellow_cards),
        ("AwayYellowCards", stats.away_yellow_cards),
        ("HomeRedCards", stats.home_red_cards),
        ("AwayRedCards", stats.away_red_cards),
    ]
    .into_iter()
    .map(|(name, value)| (name, value as f64))
    .collect();

    for team in TEAMS {
        record.insert(home_flag(team), indicator(team == stats.home_team));
    }
    for team in TEAMS {
        record.insert(away_flag(team), indicator(team == stats.away_team));
    }
    record
}

pub fn league_record(stats: &LeagueStatRecord) -> FeatureRecord {
    [
        ("played", stats.played),
        ("won", stats.won),
        ("drawn", stats.drawn),
        ("lost", stats.lost),
        ("gf", stats.gf),
        ("ga", stats.ga),
        ("gd", stats.gd),
        ("points", stats.points),
    ]
    .into_iter()
    .map(|(name, value)| (name, value as f64))
    .collect()
}

fn indicator(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn arsenal_chelsea() -> MatchStatRecord {
        MatchStatRecord {
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea".to_string(),
            ..MatchStatRecord::default()
        }
    }

    fn match_schema() -> Vec<String> {
        let mut names = columns(&[
            "HTHG",
            "HTAG",
            "HomeShots",
            "AwayShots",
            "HomeShotsOnTarget",
            "AwayShotsOnTarget",
            "HomeCorners",
            "AwayCorners",
            "HomeFouls",
            "AwayFouls",
            "HomeYellowCards",
            "AwayYellowCards",
            "HomeRedCards",
            "AwayRedCards",
        ]);
        names.extend(TEAMS.iter().map(|team| home_flag(team)));
        names.extend(TEAMS.iter().map(|team| away_flag(team)));
        names
    }

    #[test]
    fn test_reconcile_orders_fills_and_drops() {
        let record: FeatureRecord = [("b", 2.0), ("a", 1.0), ("extra", 9.0)].into_iter().collect();
        let vector = reconcile(&record, &columns(&["a", "missing", "b"]));
        assert_eq!(vector, vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let record = match_record(&arsenal_chelsea());
        let mut schema = match_schema();
        schema.reverse();
        schema.push("Referee_Strictness".to_string());

        let once = reconcile_record(&record, &schema);
        let twice = reconcile_record(&once, &schema);
        assert_eq!(once, twice);
        assert_eq!(reconcile(&once, &schema), reconcile(&record, &schema));
    }

    #[test]
    fn test_reconcile_empty_schema() {
        let record = league_record(&LeagueStatRecord::default());
        assert!(reconcile(&record, &[]).is_empty());
    }

    #[test]
    fn test_assemble_falls_back_to_natural_order() {
        let record = league_record(&LeagueStatRecord::default());
        assert_eq!(
            assemble(&record, None),
            vec![40.0, 27.0, 8.0, 5.0, 80.0, 30.0, 50.0, 89.0]
        );
    }

    #[test]
    fn test_feature_record_overwrites_in_place() {
        let mut record = FeatureRecord::new();
        record.insert("x", 1.0);
        record.insert("y", 2.0);
        record.insert("x", 3.0);
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(record.values(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_match_record_team_flags() {
        let record = match_record(&arsenal_chelsea());
        let reconciled = reconcile_record(&record, &match_schema());

        assert_eq!(reconciled.get("Home_Arsenal"), Some(1.0));
        assert_eq!(reconciled.get("Away_Chelsea"), Some(1.0));

        let flags: Vec<(&str, f64)> = reconciled
            .names()
            .filter(|name| name.starts_with("Home_") || name.starts_with("Away_"))
            .map(|name| (name, reconciled.get(name).unwrap()))
            .collect();
        assert_eq!(flags.len(), 42);
        assert_eq!(flags.iter().filter(|(_, v)| *v == 0.0).count(), 40);
        assert_eq!(flags.iter().filter(|(n, v)| n.starts_with("Home_") && *v == 1.0).count(), 1);
        assert_eq!(flags.iter().filter(|(n, v)| n.starts_with("Away_") && *v == 1.0).count(), 1);
    }

    #[test]
    fn test_every_distinct_pair_sets_exactly_two_flags() {
        let schema = match_schema();
        for home in TEAMS {
            for away in TEAMS.iter().filter(|away| **away != home) {
                let stats = MatchStatRecord {
                    home_team: home.to_string(),
                    away_team: away.to_string(),
                    ..MatchStatRecord::default()
                };
                let vector = reconcile(&match_record(&stats), &schema);
                let flags = &vector[14..];
                assert_eq!(flags.iter().sum::<f64>(), 2.0, "{} vs {}", home, away);
                assert_eq!(flags[..21].iter().sum::<f64>(), 1.0);
                assert_eq!(flags[21..].iter().sum::<f64>(), 1.0);
            }
        }
    }

    #[test]
    fn test_match_record_natural_order() {
        let record = match_record(&arsenal_chelsea());
        let names: Vec<&str> = record.names().collect();
        assert_eq!(names.len(), 14 + 2 * TEAMS.len());
        assert_eq!(&names[..3], &["HTHG", "HTAG", "HomeShots"]);
        assert_eq!(names[14], "Home_Arsenal");
        assert_eq!(names[14 + TEAMS.len()], "Away_Arsenal");
        assert_eq!(record.values()[..2], [1.0, 0.0]);
    }

    #[test]
    fn test_goal_layout_widths_are_pinned() {
        assert_eq!(GoalLayout::Full.column_names().len(), GoalLayout::Full.width());
        assert_eq!(GoalLayout::Compact.column_names().len(), GoalLayout::Compact.width());
        assert_eq!(GoalLayout::for_width(12), Some(GoalLayout::Full));
        assert_eq!(GoalLayout::for_width(10), Some(GoalLayout::Compact));
        assert_eq!(GoalLayout::for_width(7), None);
    }

    #[test]
    fn test_goal_vector_full_layout_order() {
        let player = PlayerStatRecord {
            position: Position::Forward,
            ..PlayerStatRecord::default()
        };
        assert_eq!(
            GoalLayout::Full.build(&player),
            vec![25.0, 20.0, 5.0, 1.0, 4.0, 0.45, 0.0, 2.80, 0.0, 1.0, 0.0, 0.0]
        );
        assert_eq!(
            GoalLayout::Full.column_names(),
            columns(&[
                "Age",
                "Appearances",
                "Goals_prev_season",
                "Penalty_Goals",
                "Non_Penalty_Goals",
                "Goals_per_90",
                "Big_6_Club_Feature",
                "League_Goals_per_Match",
                "Position_Attacking Midfielder",
                "Position_Forward",
                "Position_Midfielder",
                "Position_Winger",
            ])
        );
    }

    #[test]
    fn test_goal_vector_compact_layout_order() {
        let player = PlayerStatRecord {
            position: Position::Forward,
            ..PlayerStatRecord::default()
        };
        let vector = GoalLayout::Compact.build(&player);
        assert_eq!(vector, vec![25.0, 20.0, 5.0, 0.45, 0.0, 2.80, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(GoalLayout::Compact.column_names()[7], "Position_Forward");
    }

    #[test]
    fn test_league_record_columns() {
        let record = league_record(&LeagueStatRecord::default());
        assert_eq!(
            record.names().collect::<Vec<_>>(),
            vec!["played", "won", "drawn", "lost", "gf", "ga", "gd", "points"]
        );
    }
}
