use std::path::{Path, PathBuf};

use crate::config::ModelPaths;
use crate::models::{MatchOutcome, ModelStatus, View};
use crate::services::artifact::{ArtifactError, Estimator, ExpectedSchema, ModelArtifact};
use crate::services::features::GoalLayout;

/// Where a model's expected-column list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    Sidecar,
    Artifact,
}

impl SchemaSource {
    fn as_str(&self) -> &'static str {
        match self {
            SchemaSource::Sidecar => "sidecar",
            SchemaSource::Artifact => "artifact",
        }
    }
}

pub struct LoadedModel {
    pub estimator: Box<dyn Estimator>,
    pub schema: Option<(ExpectedSchema, SchemaSource)>,
    pub path: PathBuf,
}

impl LoadedModel {
    pub fn new(estimator: Box<dyn Estimator>, schema: Option<ExpectedSchema>, path: PathBuf) -> Self {
        let schema = match schema {
            Some(schema) => Some((schema, SchemaSource::Sidecar)),
            None => estimator.feature_names().map(|names| {
                (
                    ExpectedSchema {
                        version: "embedded".to_string(),
                        columns: names.to_vec(),
                    },
                    SchemaSource::Artifact,
                )
            }),
        };
        Self {
            estimator,
            schema,
            path,
        }
    }

    pub fn expected_columns(&self) -> Option<&[String]> {
        self.schema.as_ref().map(|(schema, _)| schema.columns.as_slice())
    }

    /// The goal layout matching this artifact's width, provided any declared
    /// schema agrees with the layout's pinned column names.
    pub fn goal_layout(&self) -> Result<GoalLayout, String> {
        let width = self.estimator.n_features();
        let layout = GoalLayout::for_width(width)
            .ok_or_else(|| format!("goal model expects {} features, no known layout has that width", width))?;
        if let Some(columns) = self.expected_columns() {
            let pinned = layout.column_names();
            if columns != pinned.as_slice() {
                return Err(format!(
                    "goal model schema {:?} does not match the {:?} layout {:?}",
                    columns, layout, pinned
                ));
            }
        }
        Ok(layout)
    }

    /// Checks that this model can serve `view`: its schema width matches the
    /// estimator and its output kind suits the view.
    pub fn check_fit(&self, view: View) -> Result<(), String> {
        let estimator = &self.estimator;
        if let Some((schema, source)) = &self.schema {
            if schema.columns.len() != estimator.n_features() {
                return Err(format!(
                    "{} schema {} declares {} columns but the model expects {} features",
                    source.as_str(),
                    schema.version,
                    schema.columns.len(),
                    estimator.n_features()
                ));
            }
        }

        match (view, estimator.classes()) {
            (View::TopGoalScorer, Some(_)) => Err(format!(
                "{} is a classifier, the goal model must be a regressor",
                estimator.kind()
            )),
            (View::TopGoalScorer, None) => self.goal_layout().map(|_| ()),
            (View::MatchWinner, Some(classes)) => {
                match classes.iter().find(|class| MatchOutcome::from_label(class).is_none()) {
                    Some(class) => Err(format!("class '{}' is not one of H, A, D", class)),
                    None => Ok(()),
                }
            }
            (View::LeagueWinner, Some(classes)) if classes.len() != 2 => Err(format!(
                "league model needs two classes, got {}",
                classes.len()
            )),
            (View::LeagueWinner, Some(_)) => Ok(()),
            (View::MatchWinner | View::LeagueWinner, None) => Err(format!(
                "{} does not predict classes",
                estimator.kind()
            )),
        }
    }
}

pub enum ModelSlot {
    Ready(LoadedModel),
    Unavailable { path: PathBuf, reason: String },
}

impl ModelSlot {
    pub fn load(view: View, path: &Path) -> Self {
        match load_model(path) {
            Ok(model) => {
                if let Err(reason) = model.check_fit(view) {
                    tracing::error!("Rejecting {} model at {}: {}", view, path.display(), reason);
                    return ModelSlot::Unavailable {
                        path: path.to_path_buf(),
                        reason,
                    };
                }
                match model.expected_columns() {
                    Some(columns) => tracing::info!(
                        "Loaded {} model ({}, {} features, {} schema columns) from {}",
                        view,
                        model.estimator.kind(),
                        model.estimator.n_features(),
                        columns.len(),
                        path.display()
                    ),
                    None => tracing::warn!(
                        "Loaded {} model ({}) from {} without an expected-column schema",
                        view,
                        model.estimator.kind(),
                        path.display()
                    ),
                }
                ModelSlot::Ready(model)
            }
            Err(e) => {
                tracing::error!("Failed to load {} model from {}: {}", view, path.display(), e);
                ModelSlot::Unavailable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn status(&self, view: View) -> ModelStatus {
        match self {
            ModelSlot::Ready(model) => ModelStatus {
                view,
                path: model.path.display().to_string(),
                available: true,
                kind: Some(model.estimator.kind().to_string()),
                n_features: Some(model.estimator.n_features()),
                schema_version: model.schema.as_ref().map(|(schema, _)| schema.version.clone()),
                schema_source: model.schema.as_ref().map(|(_, source)| source.as_str().to_string()),
                error: None,
            },
            ModelSlot::Unavailable { path, reason } => ModelStatus {
                view,
                path: path.display().to_string(),
                available: false,
                kind: None,
                n_features: None,
                schema_version: None,
                schema_source: None,
                error: Some(reason.clone()),
            },
        }
    }
}

fn load_model(path: &Path) -> Result<LoadedModel, ArtifactError> {
    let estimator = ModelArtifact::load(path)?;
    let schema = ExpectedSchema::load_sidecar(path)?;
    Ok(LoadedModel::new(estimator, schema, path.to_path_buf()))
}

/// The three models, loaded once at startup and read-only afterwards.
pub struct ModelRegistry {
    goal: ModelSlot,
    match_winner: ModelSlot,
    league: ModelSlot,
}

impl ModelRegistry {
    /// Loads every artifact. A failure in one leaves the others usable.
    pub fn load(paths: &ModelPaths) -> Self {
        Self {
            goal: ModelSlot::load(View::TopGoalScorer, &paths.goal),
            match_winner: ModelSlot::load(View::MatchWinner, &paths.match_winner),
            league: ModelSlot::load(View::LeagueWinner, &paths.league),
        }
    }

    pub fn from_slots(goal: ModelSlot, match_winner: ModelSlot, league: ModelSlot) -> Self {
        Self {
            goal,
            match_winner,
            league,
        }
    }

    pub fn slot(&self, view: View) -> &ModelSlot {
        match view {
            View::TopGoalScorer => &self.goal,
            View::MatchWinner => &self.match_winner,
            View::LeagueWinner => &self.league,
        }
    }

    pub fn statuses(&self) -> Vec<ModelStatus> {
        View::ALL
            .into_iter()
            .map(|view| self.slot(view).status(view))
            .collect()
    }
}
