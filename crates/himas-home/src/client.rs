//! Home Assistant REST API access.
//!
//! [`HomeApi`] is the seam the rest of the crate talks to; [`HaClient`] is
//! the reqwest implementation. Docs: <https://developers.home-assistant.io/docs/api/rest/>

use crate::entity::Entity;
use crate::error::ServiceError;
use async_trait::async_trait;
use himas_core::{config::HomeAssistantConfig, error::HimasError};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Operations the interpreter needs from Home Assistant.
#[async_trait]
pub trait HomeApi: Send + Sync {
    /// `GET /api/states`: every entity the token can see.
    async fn fetch_states(&self) -> Result<Vec<Entity>, HimasError>;

    /// `GET /api/states/<entity_id>`. `None` when the entity is unknown
    /// or the read fails.
    async fn fetch_state(&self, entity_id: &str) -> Option<Entity>;

    /// `POST /api/services/<domain>/<service>`.
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &Value,
    ) -> Result<(), ServiceError>;

    /// `GET /api/`: the server's status message.
    async fn api_status(&self) -> Result<String, HimasError>;
}

/// reqwest-backed Home Assistant client.
pub struct HaClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    request_timeout: Duration,
    state_timeout: Duration,
}

#[derive(Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

impl HaClient {
    pub fn from_config(config: &HomeAssistantConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            state_timeout: Duration::from_secs(config.state_timeout_secs),
        }
    }

    fn get(&self, path: &str, timeout: Duration) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .timeout(timeout)
    }
}

#[async_trait]
impl HomeApi for HaClient {
    async fn fetch_states(&self) -> Result<Vec<Entity>, HimasError> {
        let resp = self
            .get("/api/states", self.request_timeout)
            .send()
            .await
            .map_err(|e| HimasError::HomeAssistant(format!("fetching entities failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HimasError::HomeAssistant(format!(
                "fetching entities returned {status}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| HimasError::HomeAssistant(format!("invalid entity list: {e}")))
    }

    async fn fetch_state(&self, entity_id: &str) -> Option<Entity> {
        let resp = match self
            .get(&format!("/api/states/{entity_id}"), self.state_timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("error getting entity state {entity_id}: {e}");
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!("error getting entity state {entity_id}: {}", resp.status());
            return None;
        }

        match resp.json().await {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!("invalid state payload for {entity_id}: {e}");
                None
            }
        }
    }

    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &Value,
    ) -> Result<(), ServiceError> {
        let url = format!("{}/api/services/{domain}/{service}", self.base_url);
        debug!("home assistant: POST {url} {data}");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .timeout(self.request_timeout)
            .json(data)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ServiceError::status(status.as_u16(), &body))
    }

    async fn api_status(&self) -> Result<String, HimasError> {
        let resp = self
            .get("/api/", self.request_timeout)
            .send()
            .await
            .map_err(|e| HimasError::HomeAssistant(format!("status check failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HimasError::HomeAssistant(format!("HTTP {}", status.as_u16())));
        }

        let parsed: ApiStatus = resp
            .json()
            .await
            .map_err(|e| HimasError::HomeAssistant(format!("invalid status payload: {e}")))?;
        Ok(if parsed.message.is_empty() {
            "Unknown".to_string()
        } else {
            parsed.message
        })
    }
}
