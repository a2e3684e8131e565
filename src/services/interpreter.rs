//! Turns a [`Prediction`] into something a person can read.

use crate::models::{
    LogoRef, MatchOutcome, MatchStatRecord, Prediction, PredictionRequest, RenderedResult,
};
use crate::services::predictor::PredictError;
use crate::utils::{format_percentage, to_percentage, LogoResolver};

pub const GOALS_COLOR: &str = "#007bff";
pub const HOME_WIN_COLOR: &str = "#28a745";
pub const AWAY_WIN_COLOR: &str = "#ffc107";
pub const DRAW_COLOR: &str = "#17a2b8";
pub const FAVORED_COLOR: &str = "#28a745";
pub const UNFAVORED_COLOR: &str = "#dc3545";

/// Percentage above which a league winner probability counts as favoured.
pub const FAVORED_THRESHOLD: f64 = 50.0;

/// Renders the prediction for the view the request asked for. A prediction of
/// the wrong shape for that view is an `InvalidOutput` error.
pub fn interpret(
    request: &PredictionRequest,
    prediction: &Prediction,
    logos: &LogoResolver,
) -> Result<RenderedResult, PredictError> {
    match (request, prediction) {
        (PredictionRequest::TopGoalScorer(_), Prediction::Count(goals)) => Ok(goals_result(*goals)),
        (PredictionRequest::MatchWinner(stats), Prediction::Label(outcome)) => {
            Ok(match_result(*outcome, stats, logos))
        }
        (PredictionRequest::LeagueWinner(_), Prediction::Probability(p)) => Ok(league_result(*p)),
        (request, prediction) => Err(PredictError::InvalidOutput {
            view: request.view(),
            detail: format!("cannot render {:?}", prediction),
        }),
    }
}

fn goals_result(goals: u32) -> RenderedResult {
    RenderedResult {
        message: format!("Predicted Goals: {}", goals),
        color: GOALS_COLOR.to_string(),
        percentage: None,
        favored: None,
        winner: None,
        logos: vec![],
        footer: None,
    }
}

fn match_result(outcome: MatchOutcome, stats: &MatchStatRecord, logos: &LogoResolver) -> RenderedResult {
    let logo = |team: &str, caption: String| LogoRef {
        team: team.to_string(),
        path: logos.resolve(team),
        caption,
    };

    match outcome {
        MatchOutcome::HomeWin | MatchOutcome::AwayWin => {
            let (winner, venue, color) = if outcome == MatchOutcome::HomeWin {
                (&stats.home_team, "Home Win", HOME_WIN_COLOR)
            } else {
                (&stats.away_team, "Away Win", AWAY_WIN_COLOR)
            };
            RenderedResult {
                message: format!("Predicted Result: {} Win ({})", winner, venue),
                color: color.to_string(),
                percentage: None,
                favored: None,
                winner: Some(winner.clone()),
                logos: vec![logo(winner.as_str(), format!("{} - Predicted Winner", winner))],
                footer: None,
            }
        }
        MatchOutcome::Draw => RenderedResult {
            message: "Predicted Result: Draw".to_string(),
            color: DRAW_COLOR.to_string(),
            percentage: None,
            favored: None,
            winner: None,
            logos: vec![
                logo(stats.home_team.as_str(), stats.home_team.clone()),
                logo(stats.away_team.as_str(), stats.away_team.clone()),
            ],
            footer: Some("Teams Share the Points".to_string()),
        },
    }
}

fn league_result(probability: f64) -> RenderedResult {
    let percentage = to_percentage(probability);
    let formatted = format_percentage(percentage);
    let favored = percentage > FAVORED_THRESHOLD;
    RenderedResult {
        message: format!("Probability of Winning the League: {}", formatted),
        color: (if favored { FAVORED_COLOR } else { UNFAVORED_COLOR }).to_string(),
        percentage: Some(formatted),
        favored: Some(favored),
        winner: None,
        logos: vec![],
        footer: None,
    }
}
