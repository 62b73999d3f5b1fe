use anyhow::Result;
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::env;
use std::str::FromStr;

use crate::models::{League, PlayerRecord, Source};
use crate::utils::normalize_team_abbreviation;

/// Records per transaction chunk during batch loads.
const BATCH_CHUNK_SIZE: usize = 500;

pub async fn create_pool() -> Result<SqlitePool> {
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/propline.db".to_string());

    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(&database_url);

    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

pub async fn init_database() -> Result<()> {
    let pool = create_pool().await?;
    init_database_with_pool(&pool).await
}

pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prop_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id TEXT NOT NULL,
            player_name TEXT NOT NULL,
            team TEXT NOT NULL,
            opponent TEXT,
            position TEXT NOT NULL,
            stat_type TEXT NOT NULL,
            line_score REAL,
            odds_type TEXT,
            league TEXT NOT NULL,
            season INTEGER NOT NULL,
            source TEXT NOT NULL,
            game_time TEXT,
            projection_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (player_id, stat_type, season, source)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS player_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id TEXT NOT NULL,
            game_id TEXT NOT NULL,
            stat_type TEXT NOT NULL,
            player_name TEXT NOT NULL,
            team TEXT NOT NULL,
            opponent TEXT,
            position TEXT NOT NULL,
            week INTEGER,
            season INTEGER NOT NULL,
            league TEXT NOT NULL,
            source TEXT NOT NULL,
            game_time TEXT,
            passing_yards INTEGER,
            completions INTEGER,
            attempts INTEGER,
            passing_touchdowns INTEGER,
            interceptions INTEGER,
            sacks INTEGER,
            sack_yards_lost INTEGER,
            receiving_yards INTEGER,
            receptions INTEGER,
            targets INTEGER,
            receiving_touchdowns INTEGER,
            longest_reception INTEGER,
            rushing_yards INTEGER,
            rushing_attempts INTEGER,
            rushing_touchdowns INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (player_id, game_id, stat_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS games_processed (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_id TEXT NOT NULL UNIQUE,
            week INTEGER,
            season INTEGER,
            league TEXT NOT NULL,
            source TEXT NOT NULL,
            processed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            team TEXT NOT NULL,
            position TEXT NOT NULL,
            league TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            abbreviation TEXT NOT NULL,
            name TEXT NOT NULL,
            league TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (abbreviation, league)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database schema ready");
    Ok(())
}

/// Idempotent per-record write for PrizePicks projections, keyed by
/// (player_id, stat_type, season, source). Takes any executor so batch
/// loading can run it inside a transaction.
pub async fn upsert_prop_line<'e, E>(executor: E, record: &PlayerRecord) -> Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO prop_lines (
            player_id, player_name, team, opponent, position, stat_type,
            line_score, odds_type, league, season, source, game_time,
            projection_id, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (player_id, stat_type, season, source) DO UPDATE SET
            line_score = excluded.line_score,
            odds_type = excluded.odds_type,
            opponent = excluded.opponent,
            game_time = excluded.game_time,
            projection_id = excluded.projection_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&record.player_id)
    .bind(&record.player_name)
    .bind(&record.team)
    .bind(&record.opponent)
    .bind(record.position.as_str())
    .bind(&record.stat_type)
    .bind(record.line_score)
    .bind(&record.odds_type)
    .bind(record.league.as_str())
    .bind(record.season)
    .bind(record.source.as_str())
    .bind(&record.game_time)
    .bind(&record.projection_id)
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Idempotent per-record write for game stats, keyed by
/// (player_id, game_id, stat_type).
pub async fn upsert_player_stats<'e, E>(executor: E, record: &PlayerRecord) -> Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO player_stats (
            player_id, game_id, stat_type, player_name, team, opponent,
            position, week, season, league, source, game_time,
            passing_yards, completions, attempts, passing_touchdowns,
            interceptions, sacks, sack_yards_lost,
            receiving_yards, receptions, targets, receiving_touchdowns,
            longest_reception,
            rushing_yards, rushing_attempts, rushing_touchdowns,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (player_id, game_id, stat_type) DO UPDATE SET
            opponent = excluded.opponent,
            week = excluded.week,
            game_time = excluded.game_time,
            passing_yards = excluded.passing_yards,
            completions = excluded.completions,
            attempts = excluded.attempts,
            passing_touchdowns = excluded.passing_touchdowns,
            interceptions = excluded.interceptions,
            sacks = excluded.sacks,
            sack_yards_lost = excluded.sack_yards_lost,
            receiving_yards = excluded.receiving_yards,
            receptions = excluded.receptions,
            targets = excluded.targets,
            receiving_touchdowns = excluded.receiving_touchdowns,
            longest_reception = excluded.longest_reception,
            rushing_yards = excluded.rushing_yards,
            rushing_attempts = excluded.rushing_attempts,
            rushing_touchdowns = excluded.rushing_touchdowns,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&record.player_id)
    .bind(&record.game_id)
    .bind(&record.stat_type)
    .bind(&record.player_name)
    .bind(&record.team)
    .bind(&record.opponent)
    .bind(record.position.as_str())
    .bind(record.week)
    .bind(record.season)
    .bind(record.league.as_str())
    .bind(record.source.as_str())
    .bind(&record.game_time)
    .bind(record.passing_yards)
    .bind(record.completions)
    .bind(record.attempts)
    .bind(record.passing_touchdowns)
    .bind(record.interceptions)
    .bind(record.sacks)
    .bind(record.sack_yards_lost)
    .bind(record.receiving_yards)
    .bind(record.receptions)
    .bind(record.targets)
    .bind(record.receiving_touchdowns)
    .bind(record.longest_reception)
    .bind(record.rushing_yards)
    .bind(record.rushing_attempts)
    .bind(record.rushing_touchdowns)
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_game_processed(
    pool: &SqlitePool,
    game_id: &str,
    week: Option<i32>,
    season: i32,
    league: League,
    source: Source,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO games_processed (game_id, week, season, league, source, processed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (game_id) DO UPDATE SET
            week = excluded.week,
            season = excluded.season,
            processed_at = excluded.processed_at
        "#,
    )
    .bind(game_id)
    .bind(week)
    .bind(season)
    .bind(league.as_str())
    .bind(source.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_player(pool: &SqlitePool, record: &PlayerRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO players (player_id, name, team, position, league, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (player_id) DO UPDATE SET
            team = excluded.team,
            position = excluded.position,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&record.player_id)
    .bind(&record.player_name)
    .bind(&record.team)
    .bind(record.position.as_str())
    .bind(record.league.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_team(pool: &SqlitePool, team_name: &str, league: League) -> Result<()> {
    let abbreviation = normalize_team_abbreviation(team_name);
    sqlx::query(
        r#"
        INSERT INTO teams (abbreviation, name, league, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (abbreviation, league) DO UPDATE SET
            name = excluded.name,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&abbreviation)
    .bind(team_name)
    .bind(league.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Outcome of a chunked batch load.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub attempted: usize,
    pub inserted: usize,
    pub failed_chunks: usize,
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn all_inserted(&self) -> bool {
        self.failed_chunks == 0 && self.inserted == self.attempted
    }
}

/// Which table a batch of records belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    PropLines,
    PlayerStats,
}

impl Destination {
    /// Projections go to prop_lines, everything else to player_stats.
    pub fn for_source(source: Source) -> Destination {
        match source {
            Source::PrizePicks => Destination::PropLines,
            Source::CollegeFootballData | Source::RapidApi => Destination::PlayerStats,
        }
    }
}

/// Load a batch in transactional chunks. A failing chunk is rolled back and
/// counted, then loading continues with the next chunk. Player and team
/// reference rows are refreshed alongside the stat rows.
pub async fn batch_insert(
    pool: &SqlitePool,
    records: &[PlayerRecord],
    destination: Destination,
) -> Result<BatchResult> {
    let mut result = BatchResult {
        attempted: records.len(),
        ..Default::default()
    };

    for (chunk_index, chunk) in records.chunks(BATCH_CHUNK_SIZE).enumerate() {
        let mut tx = pool.begin().await?;
        let mut chunk_failed = false;

        for record in chunk {
            let outcome = match destination {
                Destination::PropLines => upsert_prop_line(&mut *tx, record).await,
                Destination::PlayerStats => upsert_player_stats(&mut *tx, record).await,
            };
            if let Err(e) = outcome {
                result.errors.push(format!(
                    "chunk {chunk_index}: \"{}\" failed: {e}",
                    record.player_name
                ));
                chunk_failed = true;
                break;
            }
        }

        if chunk_failed {
            tx.rollback().await?;
            result.failed_chunks += 1;
            tracing::warn!(chunk = chunk_index, "chunk rolled back");
            continue;
        }

        tx.commit().await?;
        result.inserted += chunk.len();
    }

    // Reference tables outside the chunk transactions; failures here are
    // logged, not fatal to the load.
    for record in records {
        if let Err(e) = upsert_player(pool, record).await {
            tracing::warn!(player = %record.player_name, "player upsert failed: {e}");
        }
        if let Err(e) = upsert_team(pool, &record.team, record.league).await {
            tracing::warn!(team = %record.team, "team upsert failed: {e}");
        }
    }

    tracing::info!(
        attempted = result.attempted,
        inserted = result.inserted,
        failed_chunks = result.failed_chunks,
        "batch load finished"
    );
    Ok(result)
}

pub async fn is_game_processed(pool: &SqlitePool, game_id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM games_processed WHERE game_id = ?")
        .bind(game_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Row counts for the status command.
#[derive(Debug, Default)]
pub struct TableCounts {
    pub prop_lines: i64,
    pub player_stats: i64,
    pub games_processed: i64,
    pub players: i64,
    pub teams: i64,
}

pub async fn table_counts(pool: &SqlitePool) -> Result<TableCounts> {
    let mut counts = TableCounts::default();
    counts.prop_lines = count_rows(pool, "prop_lines").await?;
    counts.player_stats = count_rows(pool, "player_stats").await?;
    counts.games_processed = count_rows(pool, "games_processed").await?;
    counts.players = count_rows(pool, "players").await?;
    counts.teams = count_rows(pool, "teams").await?;
    Ok(counts)
}

async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    // Table names come from the fixed list above, never user input.
    let row = sqlx::query(&format!("SELECT COUNT(*) as n FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn stat_record(name: &str, game_id: &str) -> PlayerRecord {
        let mut r = PlayerRecord::new(
            name,
            "KC",
            "DET",
            Position::Qb,
            "passing",
            League::Nfl,
            Source::RapidApi,
        );
        r.season = 2023;
        r.player_id = format!("{:0>16}", name.len());
        r.game_id = Some(game_id.to_string());
        r.passing_yards = Some(300);
        r
    }

    // Every pooled connection to ":memory:" gets its own database, so the
    // test pool is pinned to a single connection.
    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_database_with_pool(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let pool = test_pool().await;
        let record = stat_record("Patrick Mahomes", "g1");
        upsert_player_stats(&pool, &record).await.unwrap();
        upsert_player_stats(&pool, &record).await.unwrap();

        let counts = table_counts(&pool).await.unwrap();
        assert_eq!(counts.player_stats, 1);
    }

    #[tokio::test]
    async fn batch_insert_loads_all_records() {
        let pool = test_pool().await;
        let records = vec![
            stat_record("Patrick Mahomes", "g1"),
            stat_record("Jared Goff", "g1"),
        ];
        let result = batch_insert(&pool, &records, Destination::PlayerStats)
            .await
            .unwrap();
        assert!(result.all_inserted());
        assert_eq!(result.inserted, 2);

        let counts = table_counts(&pool).await.unwrap();
        assert_eq!(counts.player_stats, 2);
        assert_eq!(counts.players, 2);
        assert_eq!(counts.teams, 1);
    }

    #[tokio::test]
    async fn games_processed_tracking() {
        let pool = test_pool().await;
        assert!(!is_game_processed(&pool, "g9").await.unwrap());
        upsert_game_processed(&pool, "g9", Some(1), 2023, League::Nfl, Source::RapidApi)
            .await
            .unwrap();
        assert!(is_game_processed(&pool, "g9").await.unwrap());
    }

    #[test]
    fn destination_routing_by_source() {
        assert_eq!(
            Destination::for_source(Source::PrizePicks),
            Destination::PropLines
        );
        assert_eq!(
            Destination::for_source(Source::RapidApi),
            Destination::PlayerStats
        );
    }
}
