use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// "ai" or "demo", depending on how the backend produced the answer.
    #[serde(default)]
    pub mode: Option<String>,
}

impl ChatReply {
    /// The answer text, if the backend actually produced one.
    pub fn answer(&self) -> Option<&str> {
        self.response.as_deref().filter(|text| !text.is_empty())
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthReport {
    pub fn is_connected(&self) -> bool {
        self.status.as_deref() == Some("connected")
    }
}

/// Body of `GET /info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BotInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
}

/// The two calls a chat session needs from the backend.
#[async_trait]
pub trait BotBackend: Send + Sync {
    async fn health(&self) -> Result<HealthReport, ClientError>;

    async fn chat(&self, query: &str) -> Result<ChatReply, ClientError>;

    /// Base URL, used when telling the user where the server should be.
    fn base_url(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            health_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct SafetyBotClient {
    client: Client,
    base_url: String,
    settings: ClientSettings,
}

impl SafetyBotClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_settings(base_url, ClientSettings::default())
    }

    pub fn with_settings(base_url: &str, settings: ClientSettings) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn info(&self) -> Result<BotInfo, ClientError> {
        let response = self.client.get(self.endpoint("info")).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::HttpStatus(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl BotBackend for SafetyBotClient {
    async fn health(&self) -> Result<HealthReport, ClientError> {
        let response = self
            .client
            .get(self.endpoint("health"))
            .timeout(self.settings.health_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("health check returned {}", status);
            return Err(ClientError::HttpStatus(status.as_u16()));
        }

        let report: HealthReport = response.json().await?;
        debug!("health check status={:?}", report.status);
        Ok(report)
    }

    async fn chat(&self, query: &str) -> Result<ChatReply, ClientError> {
        let response = self
            .client
            .post(self.endpoint("chat"))
            .json(&ChatRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status.as_u16()));
        }

        let reply: ChatReply = response.json().await?;
        debug!(
            "chat reply status={:?} mode={:?} len={}",
            reply.status,
            reply.mode,
            reply.response.as_deref().map_or(0, str::len)
        );
        Ok(reply)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
