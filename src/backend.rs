use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{GroupResult, IndividualResult, PlayerBatch};

/// The backend wraps every feed in the same ad hoc envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    error_message: Option<String>,
    data: Option<T>,
}

/// Read-only client for the academy backend's `/api/v1` feeds.
pub struct BackendClient {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("KPM_BACKEND_URL")
            .map_err(|_| AppError::Internal("KPM_BACKEND_URL is not set".to_string()))?;
        Ok(Self::new(base_url))
    }

    async fn get_feed<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/api/v1{}", self.base_url, path);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }

        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            return Err(AppError::Upstream(
                envelope
                    .error_message
                    .unwrap_or_else(|| format!("{} reported failure", path)),
            ));
        }
        envelope
            .data
            .ok_or_else(|| AppError::Upstream(format!("{} returned no data", path)))
    }

    /// Year-partitioned player rows.
    pub async fn fetch_player_batches(&self) -> Result<Vec<PlayerBatch>> {
        self.get_feed("/home/players").await
    }

    pub async fn fetch_individual_results(&self) -> Result<Vec<IndividualResult>> {
        self.get_feed("/results").await
    }

    pub async fn fetch_group_results(&self) -> Result<Vec<GroupResult>> {
        self.get_feed("/group-results").await
    }
}
