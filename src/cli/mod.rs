use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::models::{
    LeagueStatRecord, MatchStatRecord, PlayerStatRecord, Position, PredictionRequest, TEAMS,
};
use crate::services::{interpret, ModelRegistry, PredictError, PredictionEngine};
use crate::utils::{sample_league_table, LogoResolver};

#[derive(Debug, Clone, Args)]
pub struct GoalArgs {
    #[arg(long, default_value_t = 25)]
    pub age: i64,
    #[arg(long, default_value_t = 20)]
    pub appearances: i64,
    #[arg(long, default_value_t = 5)]
    pub goals_prev_season: i64,
    #[arg(long, default_value_t = 1)]
    pub penalty_goals: i64,
    #[arg(long, default_value_t = 4)]
    pub non_penalty_goals: i64,
    #[arg(long, default_value_t = 0.45)]
    pub goals_per_90: f64,
    /// 0 = no, 1 = yes
    #[arg(long, default_value_t = 0)]
    pub big_6_club: i64,
    #[arg(long, default_value_t = 2.80)]
    pub league_goals_per_match: f64,
    /// Attacking Midfielder, Forward, Midfielder or Winger
    #[arg(long, default_value = "Attacking Midfielder")]
    pub position: Position,
}

impl From<GoalArgs> for PlayerStatRecord {
    fn from(args: GoalArgs) -> Self {
        PlayerStatRecord {
            age: args.age,
            appearances: args.appearances,
            goals_prev_season: args.goals_prev_season,
            penalty_goals: args.penalty_goals,
            non_penalty_goals: args.non_penalty_goals,
            goals_per_90: args.goals_per_90,
            big_6_club: args.big_6_club,
            league_goals_per_match: args.league_goals_per_match,
            position: args.position,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct MatchArgs {
    #[arg(long, default_value = TEAMS[0])]
    pub home: String,
    #[arg(long, default_value = TEAMS[1])]
    pub away: String,
    #[arg(long, default_value_t = 1)]
    pub home_ht_goals: i64,
    #[arg(long, default_value_t = 0)]
    pub away_ht_goals: i64,
    #[arg(long, default_value_t = 15)]
    pub home_shots: i64,
    #[arg(long, default_value_t = 10)]
    pub away_shots: i64,
    #[arg(long, default_value_t = 5)]
    pub home_shots_on_target: i64,
    #[arg(long, default_value_t = 3)]
    pub away_shots_on_target: i64,
    #[arg(long, default_value_t = 7)]
    pub home_corners: i64,
    #[arg(long, default_value_t = 4)]
    pub away_corners: i64,
    #[arg(long, default_value_t = 10)]
    pub home_fouls: i64,
    #[arg(long, default_value_t = 12)]
    pub away_fouls: i64,
    #[arg(long, default_value_t = 1)]
    pub home_yellow_cards: i64,
    #[arg(long, default_value_t = 2)]
    pub away_yellow_cards: i64,
    #[arg(long, default_value_t = 0)]
    pub home_red_cards: i64,
    #[arg(long, default_value_t = 0)]
    pub away_red_cards: i64,
}

impl From<MatchArgs> for MatchStatRecord {
    fn from(args: MatchArgs) -> Self {
        MatchStatRecord {
            home_team: args.home,
            away_team: args.away,
            home_half_time_goals: args.home_ht_goals,
            away_half_time_goals: args.away_ht_goals,
            home_shots: args.home_shots,
            away_shots: args.away_shots,
            home_shots_on_target: args.home_shots_on_target,
            away_shots_on_target: args.away_shots_on_target,
            home_corners: args.home_corners,
            away_corners: args.away_corners,
            home_fouls: args.home_fouls,
            away_fouls: args.away_fouls,
            home_yellow_cards: args.home_yellow_cards,
            away_yellow_cards: args.away_yellow_cards,
            home_red_cards: args.home_red_cards,
            away_red_cards: args.away_red_cards,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct LeagueArgs {
    /// CSV file with played,won,drawn,lost,gf,ga,gd,points columns (and an optional team column)
    #[arg(long)]
    pub csv: Option<String>,
    #[arg(long, default_value_t = 40)]
    pub played: i64,
    #[arg(long, default_value_t = 27)]
    pub won: i64,
    #[arg(long, default_value_t = 8)]
    pub drawn: i64,
    #[arg(long, default_value_t = 5)]
    pub lost: i64,
    #[arg(long, default_value_t = 80)]
    pub gf: i64,
    #[arg(long, default_value_t = 30)]
    pub ga: i64,
    #[arg(long, default_value_t = 50, allow_negative_numbers = true)]
    pub gd: i64,
    #[arg(long, default_value_t = 89)]
    pub points: i64,
}

impl From<&LeagueArgs> for LeagueStatRecord {
    fn from(args: &LeagueArgs) -> Self {
        LeagueStatRecord {
            played: args.played,
            won: args.won,
            drawn: args.drawn,
            lost: args.lost,
            gf: args.gf,
            ga: args.ga,
            gd: args.gd,
            points: args.points,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct LeagueCsvRow {
    #[serde(default)]
    team: Option<String>,
    played: i64,
    won: i64,
    drawn: i64,
    lost: i64,
    gf: i64,
    ga: i64,
    gd: i64,
    points: i64,
}

impl LeagueCsvRow {
    fn stats(&self) -> LeagueStatRecord {
        LeagueStatRecord {
            played: self.played,
            won: self.won,
            drawn: self.drawn,
            lost: self.lost,
            gf: self.gf,
            ga: self.ga,
            gd: self.gd,
            points: self.points,
        }
    }
}

fn engine(config: &Config) -> PredictionEngine {
    PredictionEngine::new(Arc::new(ModelRegistry::load(&config.models)))
}

pub fn predict(config: &Config, request: PredictionRequest) -> Result<()> {
    let engine = engine(config);
    let logos = LogoResolver::new(config.logo_dir.clone());

    println!("🔮 {} prediction", request.view());

    match engine
        .dispatch(&request)
        .and_then(|prediction| interpret(&request, &prediction, &logos))
    {
        Ok(rendered) => {
            println!("✅ {}", rendered.message);
            if let Some(winner) = &rendered.winner {
                println!("   🏆 {} - Predicted Winner", winner);
            }
            if let Some(footer) = &rendered.footer {
                println!("   🤝 {}", footer);
            }
            if let Some(favored) = rendered.favored {
                println!("   {}", if favored { "🟢 Favored" } else { "🔴 Not favored" });
            }
        }
        Err(e) if e.is_validation() => {
            println!("❌ {}", e);
        }
        Err(PredictError::ModelUnavailable { view, reason }) => {
            println!("⚠️  {} model is unavailable: {}", view, reason);
            println!("💡 Check the artifact path with: pitchcast models");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub fn predict_league_csv(config: &Config, path: &Path) -> Result<()> {
    let engine = engine(config);
    let logos = LogoResolver::new(config.logo_dir.clone());
    let mut reader = csv::Reader::from_path(path)?;

    println!("📥 Scoring league rows from {}", path.display());

    let mut scored = 0;
    for (i, row) in reader.deserialize::<LeagueCsvRow>().enumerate() {
        let row = row?;
        let stats = row.stats();
        let label = row.team.unwrap_or_else(|| format!("Row {}", i + 1));
        let request = PredictionRequest::LeagueWinner(stats);
        match engine
            .dispatch(&request)
            .and_then(|prediction| interpret(&request, &prediction, &logos))
        {
            Ok(rendered) => {
                println!(
                    "   {} {}: {}",
                    if rendered.favored == Some(true) { "🟢" } else { "🔴" },
                    label,
                    rendered.percentage.unwrap_or_default()
                );
                scored += 1;
            }
            Err(PredictError::ModelUnavailable { reason, .. }) => {
                println!("⚠️  League Winner model is unavailable: {}", reason);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✅ Scored {} rows", scored);
    Ok(())
}

pub fn show_sample_table() {
    println!("\n📊 Sample League Table for Context:");
    println!("   {:<8} {:>6} {:>4} {:>6} {:>5} {:>4} {:>4} {:>4} {:>6}", "", "played", "won", "drawn", "lost", "gf", "ga", "gd", "points");
    for row in sample_league_table() {
        let s = &row.stats;
        println!(
            "   {:<8} {:>6} {:>4} {:>6} {:>5} {:>4} {:>4} {:>4} {:>6}",
            row.team, s.played, s.won, s.drawn, s.lost, s.gf, s.ga, s.gd, s.points
        );
    }
}

pub fn list_teams(config: &Config) {
    let logos = LogoResolver::new(config.logo_dir.clone());
    println!("⚽ Teams ({}):", TEAMS.len());
    for team in TEAMS {
        println!("   • {} ({})", team, logos.resolve(team));
    }
}

pub fn show_models(config: &Config) {
    let registry = ModelRegistry::load(&config.models);

    println!("🧠 Model artifacts:\n");
    for status in registry.statuses() {
        if status.available {
            println!("✅ {} ({})", status.view, status.path);
            println!(
                "   {} with {} features, schema: {}",
                status.kind.unwrap_or_default(),
                status.n_features.unwrap_or_default(),
                match (status.schema_version, status.schema_source) {
                    (Some(version), Some(source)) => format!("{} ({})", version, source),
                    _ => "none, natural order".to_string(),
                }
            );
        } else {
            println!("❌ {} ({})", status.view, status.path);
            println!("   {}", status.error.unwrap_or_default());
        }
    }
}
