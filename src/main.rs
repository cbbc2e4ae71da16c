mod api;
mod cli;
mod db;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::models::CURRENT_SEASON;

#[derive(Parser)]
#[command(name = "pitchrank")]
#[command(about = "Football team-strength scoring and odds generation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Collect teams, matches and derived metrics for a competition
    Collect {
        /// football-data.org competition code, e.g. PL, PD, BL1
        #[arg(short, long)]
        league: String,
        #[arg(short, long, default_value = CURRENT_SEASON)]
        season: String,
    },
    /// Score all teams under a profile and persist the results
    Score {
        #[arg(short, long, default_value = "full")]
        profile: String,
        #[arg(short, long, default_value = CURRENT_SEASON)]
        season: String,
    },
    /// Compare two teams: probabilities and decimal odds
    Compare {
        /// Home team name (substring match)
        #[arg(long)]
        home: String,
        /// Away team name (substring match)
        #[arg(long)]
        away: String,
        #[arg(short, long, default_value = "full")]
        profile: String,
        #[arg(short, long, default_value = CURRENT_SEASON)]
        season: String,
        /// Bookmaker margin for decimal odds
        #[arg(short, long)]
        margin: Option<f64>,
    },
    /// Query a team's stored metrics and strength
    Team {
        #[arg(short, long)]
        name: String,
    },
    /// Initialize the database
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting pitchrank API server on port {}", port);
            api::serve(port).await?;
        }
        Some(Commands::Collect { league, season }) => {
            tracing::info!("Collecting data for league: {}", league);
            cli::collect(&league, &season).await?;
        }
        Some(Commands::Score { profile, season }) => {
            tracing::info!("Scoring teams with profile: {}", profile);
            cli::score(&profile, &season).await?;
        }
        Some(Commands::Compare {
            home,
            away,
            profile,
            season,
            margin,
        }) => {
            tracing::info!("Comparing {} vs {}", home, away);
            cli::compare(&home, &away, &profile, &season, margin).await?;
        }
        Some(Commands::Team { name }) => {
            tracing::info!("Querying team: {}", name);
            cli::query_team(&name).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            db::init_database().await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting pitchrank API server on port 3000");
            api::serve(3000).await?;
        }
    }

    Ok(())
}
