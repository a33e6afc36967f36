use config::{Config, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ExporterError, Result};

/// Environment variable prefix, e.g. `YNAB_BUDGET_ID`
pub const ENV_PREFIX: &str = "YNAB";

pub const DEFAULT_REFRESH_TIME_SECS: u64 = 3600;

pub const DEFAULT_API_BASE_URL: &str = "https://api.youneedabudget.com/v1/";

/// Exporter configuration, loaded once at startup.
#[derive(Debug, Deserialize)]
pub struct ExporterConfig {
    /// Budget whose categories are exported
    pub budget_id: String,
    /// Personal access token for the budgeting API
    pub api_token: Secret<String>,
    /// Seconds between refreshes
    #[serde(default = "default_refresh_time_secs")]
    pub refresh_time_secs: u64,
    /// Base URL of the budgeting API, including the version segment
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl ExporterConfig {
    pub fn new(budget_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            budget_id: budget_id.into(),
            api_token: Secret::new(api_token.into()),
            refresh_time_secs: default_refresh_time_secs(),
            api_base_url: default_api_base_url(),
        }
    }

    /// Load configuration from `YNAB_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_env(ENV_PREFIX)
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self> {
        Self::from_environment(Environment::with_prefix(prefix))
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment. Keys carry the `YNAB_` prefix.
    pub fn load_from_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let config = Config::builder()
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("refresh_time_secs", DEFAULT_REFRESH_TIME_SECS)?
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn with_refresh_time_secs(mut self, seconds: u64) -> Self {
        self.refresh_time_secs = seconds;
        self
    }

    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_time_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.budget_id.trim().is_empty() {
            return Err(ExporterError::Config("budget_id must not be empty".to_string()));
        }
        if self.api_token.expose_secret().trim().is_empty() {
            return Err(ExporterError::Config("api_token must not be empty".to_string()));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ExporterError::Config("api_base_url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_refresh_time_secs() -> u64 {
    DEFAULT_REFRESH_TIME_SECS
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
