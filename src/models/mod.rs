use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod teams;

pub use teams::*;

/// The three mutually exclusive prediction views. The first one is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    TopGoalScorer,
    MatchWinner,
    LeagueWinner,
}

impl View {
    pub const ALL: [View; 3] = [View::TopGoalScorer, View::MatchWinner, View::LeagueWinner];

    pub fn title(&self) -> &'static str {
        match self {
            View::TopGoalScorer => "Top Goal Scorer",
            View::MatchWinner => "Match Winner",
            View::LeagueWinner => "League Winner",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            View::TopGoalScorer => "top_goal_scorer",
            View::MatchWinner => "match_winner",
            View::LeagueWinner => "league_winner",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        View::ALL
            .into_iter()
            .find(|view| view.slug() == normalized)
            .ok_or_else(|| format!("unknown view '{}'", s))
    }
}

/// Playing position, one-hot encoded into four slots in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    #[serde(rename = "Attacking Midfielder")]
    AttackingMidfielder,
    Forward,
    Midfielder,
    Winger,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::AttackingMidfielder,
        Position::Forward,
        Position::Midfielder,
        Position::Winger,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Position::AttackingMidfielder => "Attacking Midfielder",
            Position::Forward => "Forward",
            Position::Midfielder => "Midfielder",
            Position::Winger => "Winger",
        }
    }

    pub fn one_hot(&self) -> [f64; 4] {
        let mut encoded = [0.0; 4];
        let slot = Position::ALL.iter().position(|p| p == self).unwrap_or(0);
        encoded[slot] = 1.0;
        encoded
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Position::ALL
            .into_iter()
            .find(|p| p.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown position '{}', expected one of: {}",
                    s,
                    Position::ALL.map(|p| p.label()).join(", ")
                )
            })
    }
}

/// Season statistics for a single player, as entered on the goal-scorer form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStatRecord {
    pub age: i64,
    pub appearances: i64,
    pub goals_prev_season: i64,
    pub penalty_goals: i64,
    pub non_penalty_goals: i64,
    pub goals_per_90: f64,
    pub big_6_club: i64,
    pub league_goals_per_match: f64,
    pub position: Position,
}

impl Default for PlayerStatRecord {
    fn default() -> Self {
        Self {
            age: 25,
            appearances: 20,
            goals_prev_season: 5,
            penalty_goals: 1,
            non_penalty_goals: 4,
            goals_per_90: 0.45,
            big_6_club: 0,
            league_goals_per_match: 2.80,
            position: Position::default(),
        }
    }
}

impl PlayerStatRecord {
    /// Applies the input form's range limits.
    pub fn clamped(self) -> Self {
        Self {
            age: self.age.clamp(16, 45),
            appearances: self.appearances.clamp(0, 38),
            goals_prev_season: self.goals_prev_season.max(0),
            penalty_goals: self.penalty_goals.max(0),
            non_penalty_goals: self.non_penalty_goals.max(0),
            goals_per_90: self.goals_per_90.max(0.0),
            big_6_club: self.big_6_club.clamp(0, 1),
            league_goals_per_match: self.league_goals_per_match.max(0.0),
            position: self.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStatRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_half_time_goals: i64,
    pub away_half_time_goals: i64,
    pub home_shots: i64,
    pub away_shots: i64,
    pub home_shots_on_target: i64,
    pub away_shots_on_target: i64,
    pub home_corners: i64,
    pub away_corners: i64,
    pub home_fouls: i64,
    pub away_fouls: i64,
    pub home_yellow_cards: i64,
    pub away_yellow_cards: i64,
    pub home_red_cards: i64,
    pub away_red_cards: i64,
}

impl Default for MatchStatRecord {
    fn default() -> Self {
        Self {
            home_team: TEAMS[0].to_string(),
            away_team: TEAMS[1].to_string(),
            home_half_time_goals: 1,
            away_half_time_goals: 0,
            home_shots: 15,
            away_shots: 10,
            home_shots_on_target: 5,
            away_shots_on_target: 3,
            home_corners: 7,
            away_corners: 4,
            home_fouls: 10,
            away_fouls: 12,
            home_yellow_cards: 1,
            away_yellow_cards: 2,
            home_red_cards: 0,
            away_red_cards: 0,
        }
    }
}

impl MatchStatRecord {
    /// Every match counter is non-negative.
    pub fn clamped(self) -> Self {
        Self {
            home_half_time_goals: self.home_half_time_goals.max(0),
            away_half_time_goals: self.away_half_time_goals.max(0),
            home_shots: self.home_shots.max(0),
            away_shots: self.away_shots.max(0),
            home_shots_on_target: self.home_shots_on_target.max(0),
            away_shots_on_target: self.away_shots_on_target.max(0),
            home_corners: self.home_corners.max(0),
            away_corners: self.away_corners.max(0),
            home_fouls: self.home_fouls.max(0),
            away_fouls: self.away_fouls.max(0),
            home_yellow_cards: self.home_yellow_cards.max(0),
            away_yellow_cards: self.away_yellow_cards.max(0),
            home_red_cards: self.home_red_cards.max(0),
            away_red_cards: self.away_red_cards.max(0),
            ..self
        }
    }
}

/// Season-end table row for one team. Cross-field consistency is not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueStatRecord {
    pub played: i64,
    pub won: i64,
    pub drawn: i64,
    pub lost: i64,
    pub gf: i64,
    pub ga: i64,
    pub gd: i64,
    pub points: i64,
}

impl Default for LeagueStatRecord {
    fn default() -> Self {
        Self {
            played: 40,
            won: 27,
            drawn: 8,
            lost: 5,
            gf: 80,
            ga: 30,
            gd: 50,
            points: 89,
        }
    }
}

impl LeagueStatRecord {
    /// Goal difference may be negative; everything else is floored at zero.
    pub fn clamped(self) -> Self {
        Self {
            played: self.played.max(0),
            won: self.won.max(0),
            drawn: self.drawn.max(0),
            lost: self.lost.max(0),
            gf: self.gf.max(0),
            ga: self.ga.max(0),
            gd: self.gd,
            points: self.points.max(0),
        }
    }
}

/// A request for any of the three views, tagged by `view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PredictionRequest {
    TopGoalScorer(PlayerStatRecord),
    MatchWinner(MatchStatRecord),
    LeagueWinner(LeagueStatRecord),
}

impl PredictionRequest {
    pub fn view(&self) -> View {
        match self {
            PredictionRequest::TopGoalScorer(_) => View::TopGoalScorer,
            PredictionRequest::MatchWinner(_) => View::MatchWinner,
            PredictionRequest::LeagueWinner(_) => View::LeagueWinner,
        }
    }

    /// The request for `view` populated with the form defaults.
    pub fn defaults_for(view: View) -> Self {
        match view {
            View::TopGoalScorer => PredictionRequest::TopGoalScorer(PlayerStatRecord::default()),
            View::MatchWinner => PredictionRequest::MatchWinner(MatchStatRecord::default()),
            View::LeagueWinner => PredictionRequest::LeagueWinner(LeagueStatRecord::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Full-time result as labelled by the match classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl MatchOutcome {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "H" => Some(MatchOutcome::HomeWin),
            "A" => Some(MatchOutcome::AwayWin),
            "D" => Some(MatchOutcome::Draw),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchOutcome::HomeWin => "H",
            MatchOutcome::AwayWin => "A",
            MatchOutcome::Draw => "D",
        }
    }

    pub fn winning_side(&self) -> Option<Side> {
        match self {
            MatchOutcome::HomeWin => Some(Side::Home),
            MatchOutcome::AwayWin => Some(Side::Away),
            MatchOutcome::Draw => None,
        }
    }
}

/// Model output, unified across the regressor and both classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Prediction {
    Count(u32),
    Label(MatchOutcome),
    Probability(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoRef {
    pub team: String,
    pub path: String,
    pub caption: String,
}

/// What a client needs to show a prediction: message, banner colour and logos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedResult {
    pub message: String,
    pub color: String,
    pub percentage: Option<String>,
    pub favored: Option<bool>,
    pub winner: Option<String>,
    pub logos: Vec<LogoRef>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub request_id: Uuid,
    pub view: View,
    pub prediction: Prediction,
    pub rendered: RenderedResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub view: View,
    pub path: String,
    pub available: bool,
    pub kind: Option<String>,
    pub n_features: Option<usize>,
    pub schema_version: Option<String>,
    pub schema_source: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamInfo {
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewInfo {
    pub view: View,
    pub title: String,
    pub is_default: bool,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_one_hot() {
        assert_eq!(Position::Forward.one_hot(), [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(Position::AttackingMidfielder.one_hot(), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(Position::Winger.one_hot(), [0.0, 0.0, 0.0, 1.0]);
        for position in Position::ALL {
            assert_eq!(position.one_hot().iter().sum::<f64>(), 1.0);
        }
    }

    #[test]
    fn test_position_parsing() {
        assert_eq!("attacking_midfielder".parse::<Position>(), Ok(Position::AttackingMidfielder));
        assert_eq!("Forward".parse::<Position>(), Ok(Position::Forward));
        assert!("Goalkeeper".parse::<Position>().is_err());
    }

    #[test]
    fn test_view_default_and_parsing() {
        assert_eq!(View::default(), View::TopGoalScorer);
        assert_eq!("match-winner".parse::<View>(), Ok(View::MatchWinner));
        assert_eq!("League Winner".parse::<View>(), Ok(View::LeagueWinner));
        assert!("standings".parse::<View>().is_err());
    }

    #[test]
    fn test_player_record_clamps() {
        let record = PlayerStatRecord {
            age: 60,
            appearances: -3,
            big_6_club: 4,
            goals_per_90: -0.5,
            ..PlayerStatRecord::default()
        }
        .clamped();
        assert_eq!(record.age, 45);
        assert_eq!(record.appearances, 0);
        assert_eq!(record.big_6_club, 1);
        assert_eq!(record.goals_per_90, 0.0);
    }

    #[test]
    fn test_league_record_keeps_negative_goal_difference() {
        let record = LeagueStatRecord { gd: -4, won: -1, ..LeagueStatRecord::default() }.clamped();
        assert_eq!(record.gd, -4);
        assert_eq!(record.won, 0);
    }

    #[test]
    fn test_request_deserializes_with_form_defaults() {
        let request: PredictionRequest =
            serde_json::from_str(r#"{"view": "league_winner", "points": 70}"#).unwrap();
        match request {
            PredictionRequest::LeagueWinner(record) => {
                assert_eq!(record.points, 70);
                assert_eq!(record.played, 40);
            }
            other => panic!("unexpected request {:?}", other),
        }

        let request: PredictionRequest = serde_json::from_str(
            r#"{"view": "top_goal_scorer", "position": "Attacking Midfielder"}"#,
        )
        .unwrap();
        assert_eq!(request.view(), View::TopGoalScorer);
    }

    #[test]
    fn test_match_outcome_labels() {
        assert_eq!(MatchOutcome::from_label("H"), Some(MatchOutcome::HomeWin));
        assert_eq!(MatchOutcome::from_label("A").and_then(|o| o.winning_side()), Some(Side::Away));
        assert_eq!(MatchOutcome::Draw.winning_side(), None);
        assert_eq!(MatchOutcome::from_label("X"), None);
    }
}
