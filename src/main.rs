mod api;
mod cli;
mod config;
mod models;
mod services;
mod utils;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cli::{GoalArgs, LeagueArgs, MatchArgs};
use crate::config::Config;
use crate::models::PredictionRequest;

#[derive(Parser)]
#[command(name = "pitchcast")]
#[command(about = "Serves goal, match and league predictions from pre-trained football models")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Predict a player's goals for the season
    Goals(GoalArgs),
    /// Predict the result of a match
    Match(MatchArgs),
    /// Predict the probability of winning the league
    League(LeagueArgs),
    /// List the teams known to the match model
    Teams,
    /// Show which model artifacts loaded
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            tracing::info!("Starting PitchCast API server on port {}", config.port);
            api::serve(config).await?;
        }
        Some(Commands::Goals(args)) => {
            cli::predict(&config, PredictionRequest::TopGoalScorer(args.into()))?;
        }
        Some(Commands::Match(args)) => {
            cli::predict(&config, PredictionRequest::MatchWinner(args.into()))?;
        }
        Some(Commands::League(args)) => match &args.csv {
            Some(path) => cli::predict_league_csv(&config, Path::new(path))?,
            None => {
                cli::predict(&config, PredictionRequest::LeagueWinner((&args).into()))?;
                cli::show_sample_table();
            }
        },
        Some(Commands::Teams) => {
            cli::list_teams(&config);
        }
        Some(Commands::Models) => {
            cli::show_models(&config);
        }
        None => {
            // Default to serving
            tracing::info!("Starting PitchCast API server on port {}", config.port);
            api::serve(config).await?;
        }
    }

    Ok(())
}
