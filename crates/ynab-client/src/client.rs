//! YNAB API client implementation

use crate::error::{Result, YnabError};
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;
use ynab_core::{CategorySource, ExporterConfig, DEFAULT_API_BASE_URL};

/// Client for the budgeting API
pub struct YnabClient {
    http: Client,
    base_url: Url,
    token: Secret<String>,
}

impl std::fmt::Debug for YnabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YnabClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Builder for creating a YnabClient
#[derive(Default)]
pub struct YnabClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl YnabClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL for the API, including the `/v1` segment
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the personal access token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set a request timeout. Requests do not time out unless this is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<YnabClient> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| YnabError::Config("an API token is required".to_string()))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(YnabError::Config(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("ynab-exporter/{}", crate::VERSION));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let mut http = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build().map_err(YnabError::Http)?;

        Ok(YnabClient {
            http,
            base_url,
            token: Secret::new(token),
        })
    }
}

/// Error envelope returned by the API on failures
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl YnabClient {
    /// Create a new client builder
    pub fn builder() -> YnabClientBuilder {
        YnabClientBuilder::new()
    }

    /// Create a client from the exporter configuration
    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        Self::builder()
            .base_url(config.api_base_url.clone())
            .token(config.api_token.expose_secret().clone())
            .build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the categories endpoint for a budget
    fn categories_url(&self, budget_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| YnabError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["budgets", budget_id, "categories"]);
        Ok(url)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    /// Handle API response
    async fn handle_response(&self, response: Response) -> Result<serde_json::Value> {
        let status = response.status();
        let body = response.text().await.map_err(YnabError::Http)?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(YnabError::Json);
        }

        let message = error_message(&body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(YnabError::Auth(message)),
            StatusCode::NOT_FOUND => Err(YnabError::NotFound(message)),
            StatusCode::TOO_MANY_REQUESTS => Err(YnabError::RateLimit(message)),
            _ if status.is_server_error() => Err(YnabError::Server {
                status: status.as_u16(),
                message,
            }),
            _ => Err(YnabError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }

    /// Fetch the raw categories response of a budget
    #[instrument(skip(self))]
    pub async fn get_categories(&self, budget_id: &str) -> Result<serde_json::Value> {
        let url = self.categories_url(budget_id)?;
        debug!(%url, "Requesting categories");

        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(YnabError::Http)?;

        self.handle_response(response).await
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope
            .error
            .detail
            .or(envelope.error.name)
            .unwrap_or_default(),
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl CategorySource for YnabClient {
    async fn fetch_categories(&self, budget_id: &str) -> ynab_core::Result<serde_json::Value> {
        Ok(self.get_categories(budget_id).await?)
    }
}
