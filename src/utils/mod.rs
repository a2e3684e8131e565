use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::models::{logo_file_name, LeagueStatRecord};

/// Shown when a team has no logo on disk.
pub const GENERIC_LOGO_URL: &str = "https://via.placeholder.com/100x100?text=LOGO";

/// URL prefix the logo directory is served under.
pub const LOGO_ROUTE: &str = "/logos";

/// Round a regression output to a whole, non-negative goal count.
/// Ties go to the even neighbour.
pub fn round_goals(raw: f64) -> u32 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round_ties_even().max(0.0).min(u32::MAX as f64) as u32
}

/// Convert a probability to a percentage in [0, 100]
pub fn to_percentage(probability: f64) -> f64 {
    if probability.is_nan() {
        return 0.0;
    }
    (probability * 100.0).clamp(0.0, 100.0)
}

/// Format a percentage with two decimals, e.g. "73.20%"
pub fn format_percentage(percentage: f64) -> String {
    format!("{:.2}%", percentage)
}

/// Maps team names to logo locations under a directory, falling back to a
/// generic placeholder when no file exists.
#[derive(Debug, Clone)]
pub struct LogoResolver {
    dir: PathBuf,
}

impl LogoResolver {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public URL path of the team's logo, or the placeholder.
    pub fn resolve(&self, team: &str) -> String {
        match logo_file_name(team) {
            Some(file) if self.dir.join(&file).is_file() => format!("{}/{}", LOGO_ROUTE, file),
            _ => GENERIC_LOGO_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleRow {
    pub team: String,
    #[serde(flatten)]
    pub stats: LeagueStatRecord,
}

/// Reference rows shown next to the league form for context.
pub fn sample_league_table() -> Vec<SampleRow> {
    let rows = [
        ("Team A", [42, 24, 12, 6, 67, 31, 36, 84]),
        ("Team B", [42, 21, 11, 10, 57, 40, 17, 74]),
        ("Team C", [42, 21, 9, 12, 61, 65, -4, 72]),
    ];
    rows.into_iter()
        .map(|(team, [played, won, drawn, lost, gf, ga, gd, points])| SampleRow {
            team: team.to_string(),
            stats: LeagueStatRecord {
                played,
                won,
                drawn,
                lost,
                gf,
                ga,
                gd,
                points,
            },
        })
        .collect()
}
