use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// One "called" ticket as the server reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct CalledTicket {
    pub queue_number: String,
    #[serde(default)]
    pub queue_type: String,
    #[serde(default)]
    pub counter_id: Option<i64>,
    #[serde(default)]
    pub called_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CounterDetail {
    pub id: i64,
    #[serde(default)]
    pub counter_number: String,
    pub counter_name: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stats {
    pub waiting_queues: i64,
}

/// Thin typed client over the server's REST endpoints. Every failure maps
/// to a String the caller logs; the next scheduled tick retries.
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("http client error: {}", e))?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        self.http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("server error: {}", e))?
            .json::<T>()
            .await
            .map_err(|e| format!("invalid response json: {}", e))
    }

    /// The single most recently called ticket, if any.
    pub async fn latest_called(&self) -> Result<Option<CalledTicket>, String> {
        let list: Vec<CalledTicket> = self.get_json("/api/queues?status=called&limit=1").await?;
        Ok(list.into_iter().next())
    }

    /// All tickets in "called" state today; the resync source of truth.
    pub async fn called_today(&self) -> Result<Vec<CalledTicket>, String> {
        self.get_json("/api/queues?status=called&date=today").await
    }

    pub async fn counter_detail(&self, id: i64) -> Result<CounterDetail, String> {
        self.get_json(&format!("/api/counter/{}", id)).await
    }

    pub async fn active_counters(&self) -> Result<Vec<CounterDetail>, String> {
        self.get_json("/api/counters?active=true").await
    }

    pub async fn stats(&self) -> Result<Stats, String> {
        self.get_json("/api/stats").await
    }
}
