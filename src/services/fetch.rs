use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::Value;
use std::env;
use std::time::Duration;

use crate::models::League;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY_SECS: u64 = 5;

const PRIZEPICKS_URL: &str = "https://api.prizepicks.com/projections";
const CFB_PLAYERS_URL: &str = "https://api.collegefootballdata.com/games/players";

/// PrizePicks league ids: 9 is NFL, 15 is college.
fn prizepicks_league_id(league: League) -> &'static str {
    match league {
        League::Nfl => "9",
        League::College => "15",
    }
}

/// HTTP client for the three vendor APIs. Credentials come from the
/// environment; a missing key fails at call time, not construction, so
/// single-source runs work with partial configuration.
pub struct Fetcher {
    client: Client,
    rapidapi_key: Option<String>,
    rapidapi_host: Option<String>,
    cfb_api_key: Option<String>,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .build()?;

        Ok(Fetcher {
            client,
            rapidapi_key: env::var("RAPIDAPI_KEY").ok(),
            rapidapi_host: env::var("RAPIDAPI_HOST").ok(),
            cfb_api_key: env::var("CFB_API_KEY").ok(),
        })
    }

    fn rapidapi_credentials(&self) -> Result<(&str, &str)> {
        match (&self.rapidapi_key, &self.rapidapi_host) {
            (Some(key), Some(host)) => Ok((key, host)),
            _ => Err(anyhow!("RAPIDAPI_KEY and RAPIDAPI_HOST must be set")),
        }
    }

    /// GET with retries on transport errors and 429/5xx responses.
    async fn get_json(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let mut last_error = None;

        for attempt in 1..=RETRY_ATTEMPTS {
            let request = request
                .try_clone()
                .ok_or_else(|| anyhow!("request is not retryable"))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<Value>().await?);
                    }
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(%status, attempt, "retryable response");
                        last_error = Some(anyhow!("HTTP {status}"));
                    } else {
                        return Err(anyhow!("HTTP {status}"));
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, "request failed: {e}");
                    last_error = Some(e.into());
                }
            }

            if attempt < RETRY_ATTEMPTS {
                tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECS)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("request failed")))
    }

    pub async fn fetch_prizepicks(&self, league: League) -> Result<Value> {
        tracing::info!(league = %league, "fetching PrizePicks projections");
        let request = self.client.get(PRIZEPICKS_URL).query(&[
            ("league_id", prizepicks_league_id(league)),
            ("per_page", "250"),
            ("single_stat", "true"),
        ]);
        self.get_json(request).await
    }

    pub async fn fetch_cfb_week(&self, year: i32, week: i32) -> Result<Value> {
        let api_key = self
            .cfb_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("CFB_API_KEY must be set"))?;

        tracing::info!(year, week, "fetching CFB player stats");
        let request = self
            .client
            .get(CFB_PLAYERS_URL)
            .header("Authorization", format!("Bearer {api_key}"))
            .query(&[
                ("year", year.to_string()),
                ("week", week.to_string()),
                ("seasonType", "regular".to_string()),
            ]);
        self.get_json(request).await
    }

    pub async fn fetch_nfl_schedule(&self, year: i32, week: i32) -> Result<Value> {
        let (key, host) = self.rapidapi_credentials()?;

        tracing::info!(year, week, "fetching NFL weekly schedule");
        let request = self
            .client
            .get(format!("https://{host}/nfl-weeks-events"))
            .header("X-RapidAPI-Key", key)
            .header("X-RapidAPI-Host", host)
            .query(&[
                ("year", year.to_string()),
                ("week", week.to_string()),
                ("type", "2".to_string()),
            ]);
        self.get_json(request).await
    }

    pub async fn fetch_nfl_boxscore(&self, event_id: &str) -> Result<Value> {
        let (key, host) = self.rapidapi_credentials()?;

        tracing::info!(event_id, "fetching NFL boxscore");
        let request = self
            .client
            .get(format!("https://{host}/nfl-boxscore"))
            .header("X-RapidAPI-Key", key)
            .header("X-RapidAPI-Host", host)
            .query(&[("id", event_id)]);
        self.get_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_ids_match_vendor_mapping() {
        assert_eq!(prizepicks_league_id(League::Nfl), "9");
        assert_eq!(prizepicks_league_id(League::College), "15");
    }
}
