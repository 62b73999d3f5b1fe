use anyhow::Result;
use chrono::Datelike;
use std::path::PathBuf;

use crate::db::{self, create_pool, Destination};
use crate::models::League;
use crate::parsers::{common, prizepicks};
use crate::services::fetch::Fetcher;
use crate::services::season::SeasonLoader;

pub async fn init_db() -> Result<()> {
    println!("🔧 Initializing database...");
    db::init_database().await?;
    println!("✅ Database schema ready!");
    Ok(())
}

/// Fetch current PrizePicks projections for one or both leagues and load
/// them into prop_lines.
pub async fn fetch_projections(league: &str) -> Result<()> {
    let pool = create_pool().await?;
    db::init_database_with_pool(&pool).await?;
    let fetcher = Fetcher::new()?;
    let default_year = chrono::Utc::now().year();

    let leagues: Vec<League> = if league.eq_ignore_ascii_case("all") {
        vec![League::Nfl, League::College]
    } else {
        match League::parse(league) {
            Some(l) => vec![l],
            None => {
                println!("❌ Unsupported league: {league}. Use 'nfl', 'college', or 'all'");
                return Ok(());
            }
        }
    };

    for league in leagues {
        println!("📥 Fetching PrizePicks projections for {league}...");
        let data = fetcher.fetch_prizepicks(league).await?;

        let extraction = prizepicks::extract(&data, default_year)?;
        common::log_extraction_summary("prizepicks", &extraction);
        println!(
            "   {} projections parsed, {} errors",
            extraction.records.len(),
            extraction.errors.len()
        );

        let result = db::batch_insert(&pool, &extraction.records, Destination::PropLines).await?;
        println!(
            "   {} of {} records loaded ({} chunks failed)",
            result.inserted, result.attempted, result.failed_chunks
        );
    }

    println!("✅ Projections loaded!");
    Ok(())
}

/// Load a full season of NFL and CFB game stats, resuming from the
/// checkpoint when one exists.
pub async fn load_season(year: i32, progress_file: Option<PathBuf>) -> Result<()> {
    let pool = create_pool().await?;
    db::init_database_with_pool(&pool).await?;
    let fetcher = Fetcher::new()?;
    let progress_path =
        progress_file.unwrap_or_else(|| PathBuf::from("data/season_progress.json"));

    println!("🏈 Loading {year} season (NFL weeks 1-18, CFB weeks 1-15)...");
    let mut loader = SeasonLoader::new(fetcher, pool, year, progress_path)?;
    loader.run().await?;
    println!("✅ Season load complete!");
    Ok(())
}

pub async fn status() -> Result<()> {
    let pool = create_pool().await?;
    db::init_database_with_pool(&pool).await?;
    let counts = db::table_counts(&pool).await?;

    println!("📊 Database status:");
    println!("   prop_lines:      {}", counts.prop_lines);
    println!("   player_stats:    {}", counts.player_stats);
    println!("   games_processed: {}", counts.games_processed);
    println!("   players:         {}", counts.players);
    println!("   teams:           {}", counts.teams);
    Ok(())
}
