use std::sync::Arc;

use thiserror::Error;

use crate::models::{
    is_known_team, suggest_team, LeagueStatRecord, MatchOutcome, MatchStatRecord,
    PlayerStatRecord, Prediction, PredictionRequest, View,
};
use crate::services::artifact::{ArtifactError, RawOutput};
use crate::services::features::{assemble, league_record, match_record};
use crate::services::registry::{LoadedModel, ModelRegistry, ModelSlot};
use crate::utils::round_goals;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{view} model unavailable: {reason}")]
    ModelUnavailable { view: View, reason: String },

    #[error("Home Team and Away Team cannot be the same. Please select different teams.")]
    SameTeam(String),

    #[error("unknown team '{name}'{}", .suggestion.map(|s| format!(", did you mean '{}'?", s)).unwrap_or_default())]
    UnknownTeam {
        name: String,
        suggestion: Option<&'static str>,
    },

    #[error("{view} model returned unusable output: {detail}")]
    InvalidOutput { view: View, detail: String },

    #[error("{0}")]
    Artifact(#[from] ArtifactError),
}

impl PredictError {
    /// Errors the caller can fix by changing the input.
    pub fn is_validation(&self) -> bool {
        matches!(self, PredictError::SameTeam(_) | PredictError::UnknownTeam { .. })
    }
}

/// Runs the collect, build, invoke steps for each view against a shared
/// read-only registry.
#[derive(Clone)]
pub struct PredictionEngine {
    registry: Arc<ModelRegistry>,
}

impl PredictionEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Routes a request to the adapter for its view.
    pub fn dispatch(&self, request: &PredictionRequest) -> Result<Prediction, PredictError> {
        match request {
            PredictionRequest::TopGoalScorer(player) => self.predict_goals(player),
            PredictionRequest::MatchWinner(stats) => self.predict_match(stats),
            PredictionRequest::LeagueWinner(stats) => self.predict_league(stats),
        }
    }

    pub fn predict_goals(&self, player: &PlayerStatRecord) -> Result<Prediction, PredictError> {
        let model = self.ready(View::TopGoalScorer)?;
        let layout = model.goal_layout().map_err(|reason| PredictError::ModelUnavailable {
            view: View::TopGoalScorer,
            reason,
        })?;
        let vector = layout.build(&player.clone().clamped());

        match model.estimator.predict(&vector)? {
            RawOutput::Scalar(goals) => {
                tracing::debug!("Goal model raw output {:.4} for {:?} layout", goals, layout);
                Ok(Prediction::Count(round_goals(goals)))
            }
            RawOutput::Label(label) => Err(PredictError::InvalidOutput {
                view: View::TopGoalScorer,
                detail: format!("expected a scalar, got label '{}'", label),
            }),
        }
    }

    pub fn predict_match(&self, stats: &MatchStatRecord) -> Result<Prediction, PredictError> {
        validate_teams(stats)?;
        let model = self.ready(View::MatchWinner)?;
        let record = match_record(&stats.clone().clamped());
        let vector = assemble(&record, model.expected_columns());

        match model.estimator.predict(&vector)? {
            RawOutput::Label(label) => match MatchOutcome::from_label(&label) {
                Some(outcome) => {
                    tracing::debug!(
                        "Match model predicts {} for {} vs {}",
                        label,
                        stats.home_team,
                        stats.away_team
                    );
                    Ok(Prediction::Label(outcome))
                }
                None => Err(PredictError::InvalidOutput {
                    view: View::MatchWinner,
                    detail: format!("unknown label '{}'", label),
                }),
            },
            RawOutput::Scalar(value) => Err(PredictError::InvalidOutput {
                view: View::MatchWinner,
                detail: format!("expected a label, got scalar {}", value),
            }),
        }
    }

    pub fn predict_league(&self, stats: &LeagueStatRecord) -> Result<Prediction, PredictError> {
        let model = self.ready(View::LeagueWinner)?;
        let record = league_record(&stats.clone().clamped());
        let vector = assemble(&record, model.expected_columns());

        let distribution = model.estimator.predict_proba(&vector)?;
        // class index 1 is "winner"
        match distribution.get(1) {
            Some(&probability) => Ok(Prediction::Probability(probability)),
            None => Err(PredictError::InvalidOutput {
                view: View::LeagueWinner,
                detail: format!("expected two classes, got {}", distribution.len()),
            }),
        }
    }

    fn ready(&self, view: View) -> Result<&LoadedModel, PredictError> {
        match self.registry.slot(view) {
            ModelSlot::Ready(model) => Ok(model),
            ModelSlot::Unavailable { reason, .. } => Err(PredictError::ModelUnavailable {
                view,
                reason: reason.clone(),
            }),
        }
    }
}

fn validate_teams(stats: &MatchStatRecord) -> Result<(), PredictError> {
    for name in [&stats.home_team, &stats.away_team] {
        if !is_known_team(name) {
            return Err(PredictError::UnknownTeam {
                name: name.clone(),
                suggestion: suggest_team(name),
            });
        }
    }
    if stats.home_team == stats.away_team {
        return Err(PredictError::SameTeam(stats.home_team.clone()));
    }
    Ok(())
}
