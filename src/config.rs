use std::env;
use std::path::PathBuf;

pub const DEFAULT_GOAL_MODEL_PATH: &str = "Top_Goal_Scorer/linear_regression_model.json";
pub const DEFAULT_MATCH_MODEL_PATH: &str = "Match_Winner/logistic_regression_model.json";
pub const DEFAULT_LEAGUE_MODEL_PATH: &str = "League Winner/league_model.json";
pub const DEFAULT_LOGO_DIR: &str = "Logos";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub goal: PathBuf,
    pub match_winner: PathBuf,
    pub league: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub models: ModelPaths,
    pub logo_dir: PathBuf,
    pub port: u16,
}

impl Config {
    /// Reads the environment (after `.env` has been loaded), falling back to
    /// the relative paths the artifacts are shipped at.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid PORT value '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            models: ModelPaths {
                goal: path("GOAL_MODEL_PATH", DEFAULT_GOAL_MODEL_PATH),
                match_winner: path("MATCH_MODEL_PATH", DEFAULT_MATCH_MODEL_PATH),
                league: path("LEAGUE_MODEL_PATH", DEFAULT_LEAGUE_MODEL_PATH),
            },
            logo_dir: path("LOGO_DIR", DEFAULT_LOGO_DIR),
            port,
        }
    }
}
