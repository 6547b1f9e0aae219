use reqwest::Client;
use trainer_core::daily::DailyPuzzle;

use crate::config::Config;

pub struct LichessClient {
    client: Client,
    base_url: String,
}

impl LichessClient {
    pub fn new(config: &Config) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent("PuzzleTrainer/1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("HTTP client error: {e}"))?;
        Ok(Self {
            client,
            base_url: config.lichess_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch today's puzzle with its source game.
    pub async fn fetch_daily(&self) -> Result<DailyPuzzle, String> {
        let url = format!("{}/api/puzzle/daily", self.base_url);

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| format!("Request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let daily: DailyPuzzle = resp
            .json()
            .await
            .map_err(|e| format!("Daily puzzle JSON parse error: {e}"))?;

        tracing::info!(
            "Fetched daily puzzle {} (initial ply {})",
            daily.puzzle.id,
            daily.puzzle.initial_ply
        );
        Ok(daily)
    }
}
