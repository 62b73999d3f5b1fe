mod cli;
mod db;
mod models;
mod parsers;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "propline")]
#[command(about = "ETL pipeline for football player stats and betting projections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    InitDb,
    /// Fetch current PrizePicks projections
    Fetch {
        /// League to fetch: nfl, college, or all
        #[arg(short, long, default_value = "all")]
        league: String,
    },
    /// Load a full season of NFL and CFB game stats
    LoadSeason {
        #[arg(short, long)]
        year: i32,
        /// Checkpoint file for resumable loads
        #[arg(long)]
        progress_file: Option<PathBuf>,
    },
    /// Show row counts per table
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => cli::init_db().await?,
        Commands::Fetch { league } => cli::fetch_projections(&league).await?,
        Commands::LoadSeason {
            year,
            progress_file,
        } => cli::load_season(year, progress_file).await?,
        Commands::Status => cli::status().await?,
    }

    Ok(())
}
