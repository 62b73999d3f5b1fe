//! Full-season loading: walks every week of the NFL and CFB regular seasons,
//! fetching, extracting, and loading each one, with a JSON checkpoint so an
//! interrupted run resumes where it left off.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::{self, Destination};
use crate::models::League;
use crate::parsers::{cfb, common, nfl_boxscore, nfl_game_ids};
use crate::services::fetch::Fetcher;

const NFL_WEEKS: std::ops::RangeInclusive<i32> = 1..=18;
const CFB_WEEKS: std::ops::RangeInclusive<i32> = 1..=15;

const DELAY_BETWEEN_WEEKS: Duration = Duration::from_secs(5);
const DELAY_BETWEEN_CALLS: Duration = Duration::from_secs(2);

/// Checkpoint written after every completed week.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Progress {
    pub year: i32,
    pub nfl_completed: Vec<i32>,
    pub cfb_completed: Vec<i32>,
    pub total_records_loaded: usize,
    pub last_updated: String,
}

impl Progress {
    pub fn load(path: &Path, year: i32) -> Result<Progress> {
        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let progress: Progress = serde_json::from_str(&raw)?;
            if progress.year == year {
                tracing::info!(
                    nfl_done = progress.nfl_completed.len(),
                    cfb_done = progress.cfb_completed.len(),
                    "resuming from checkpoint"
                );
                return Ok(progress);
            }
            tracing::info!(
                checkpoint_year = progress.year,
                requested_year = year,
                "checkpoint is for a different season, starting fresh"
            );
        }
        Ok(Progress {
            year,
            ..Default::default()
        })
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now().to_rfc3339();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub struct SeasonLoader {
    fetcher: Fetcher,
    pool: SqlitePool,
    progress: Progress,
    progress_path: PathBuf,
    year: i32,
}

impl SeasonLoader {
    pub fn new(
        fetcher: Fetcher,
        pool: SqlitePool,
        year: i32,
        progress_path: PathBuf,
    ) -> Result<Self> {
        let progress = Progress::load(&progress_path, year)?;
        Ok(SeasonLoader {
            fetcher,
            pool,
            progress,
            progress_path,
            year,
        })
    }

    /// Load the whole season for both leagues. A failed week is logged and
    /// skipped without a checkpoint entry, so the next run retries it.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(year = self.year, "starting full season load");

        for week in NFL_WEEKS {
            if self.progress.nfl_completed.contains(&week) {
                tracing::info!(week, "NFL week already loaded, skipping");
                continue;
            }
            match self.load_nfl_week(week).await {
                Ok(loaded) => {
                    self.progress.nfl_completed.push(week);
                    self.progress.total_records_loaded += loaded;
                    self.progress.save(&self.progress_path)?;
                }
                Err(e) => tracing::error!(week, "NFL week failed: {e}"),
            }
            tokio::time::sleep(DELAY_BETWEEN_WEEKS).await;
        }

        for week in CFB_WEEKS {
            if self.progress.cfb_completed.contains(&week) {
                tracing::info!(week, "CFB week already loaded, skipping");
                continue;
            }
            match self.load_cfb_week(week).await {
                Ok(loaded) => {
                    self.progress.cfb_completed.push(week);
                    self.progress.total_records_loaded += loaded;
                    self.progress.save(&self.progress_path)?;
                }
                Err(e) => tracing::error!(week, "CFB week failed: {e}"),
            }
            tokio::time::sleep(DELAY_BETWEEN_WEEKS).await;
        }

        tracing::info!(
            total_records = self.progress.total_records_loaded,
            "season load finished"
        );
        Ok(())
    }

    /// One NFL week: schedule first, then a boxscore per game. Games already
    /// in games_processed are skipped.
    pub async fn load_nfl_week(&self, week: i32) -> Result<usize> {
        let schedule = self.fetcher.fetch_nfl_schedule(self.year, week).await?;
        let game_list = nfl_game_ids::extract(&schedule, self.year, week)?;

        let mut loaded = 0;
        for game_id in &game_list.game_ids {
            if db::is_game_processed(&self.pool, game_id).await? {
                tracing::debug!(%game_id, "already processed, skipping");
                continue;
            }
            tokio::time::sleep(DELAY_BETWEEN_CALLS).await;

            let boxscore = match self.fetcher.fetch_nfl_boxscore(game_id).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(%game_id, "boxscore fetch failed: {e}");
                    continue;
                }
            };

            let extraction = nfl_boxscore::extract(&boxscore, game_id, None, self.year)?;
            common::log_extraction_summary("nfl_boxscore", &extraction);

            let result =
                db::batch_insert(&self.pool, &extraction.records, Destination::PlayerStats)
                    .await?;
            loaded += result.inserted;

            db::upsert_game_processed(
                &self.pool,
                game_id,
                Some(week),
                self.year,
                League::Nfl,
                crate::models::Source::RapidApi,
            )
            .await?;
        }

        tracing::info!(week, loaded, "NFL week loaded");
        Ok(loaded)
    }

    pub async fn load_cfb_week(&self, week: i32) -> Result<usize> {
        let data = self.fetcher.fetch_cfb_week(self.year, week).await?;
        let extraction = cfb::extract(&data, self.year)?;
        common::log_extraction_summary("cfb", &extraction);

        let result =
            db::batch_insert(&self.pool, &extraction.records, Destination::PlayerStats).await?;

        for record in &extraction.records {
            if let Some(game_id) = &record.game_id {
                db::upsert_game_processed(
                    &self.pool,
                    game_id,
                    record.week,
                    record.season,
                    League::College,
                    crate::models::Source::CollegeFootballData,
                )
                .await?;
            }
        }

        tracing::info!(week, loaded = result.inserted, "CFB week loaded");
        Ok(result.inserted)
    }
}
