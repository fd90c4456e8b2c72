//! Settings for the API client and the query engine.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `MONWATCH` using `__` between path
//! segments (`MONWATCH__API__API_KEY`, `MONWATCH__ENGINE__MAX_PAGE_COUNT`).
//!
//! ```toml
//! [api]
//! environment = "prod"
//! api_key = "..."
//! timeout_secs = 30
//!
//! [engine]
//! max_page_count = 20
//! non_success_policy = "soft_stop"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use ::config::{Config, Environment, File};
use monwatch_adapters::{ApiError, HttpMonitorApi, DEV_ENDPOINT, PROD_ENDPOINT};
use serde::{Deserialize, Serialize};

/// Which deployment of the monitoring API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiEnvironment {
    #[default]
    Prod,
    Dev,
    /// Local development against the dev endpoint or an override, with
    /// self-signed certificates accepted.
    Local,
}

impl ApiEnvironment {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            ApiEnvironment::Prod => PROD_ENDPOINT,
            ApiEnvironment::Dev | ApiEnvironment::Local => DEV_ENDPOINT,
        }
    }

    pub fn accepts_invalid_certs(self) -> bool {
        self == ApiEnvironment::Local
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub environment: ApiEnvironment,
    /// Overrides the environment's endpoint.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: ApiEnvironment::default(),
            endpoint: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.environment.default_endpoint())
    }

    /// Build the HTTP client these settings describe.
    pub fn build_client(&self) -> Result<HttpMonitorApi, ApiError> {
        let mut builder = HttpMonitorApi::builder()
            .endpoint(self.endpoint())
            .timeout(Duration::from_secs(self.timeout_secs))
            .accept_invalid_certs(self.environment.accepts_invalid_certs());
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key.as_str());
        }
        builder.build()
    }
}

/// What to do when a page comes back with a non-success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonSuccessPolicy {
    /// Log it, keep the pages fetched so far and end that stream.
    #[default]
    SoftStop,
    /// Fail the stream, and with it the query.
    Fail,
}

/// How wide table rows are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WideTableLayout {
    /// One table carrying every record.
    #[default]
    Single,
    /// One table per grouping key.
    PerSeries,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on pages fetched per stream.
    pub max_page_count: usize,
    /// How far back telemetry may be requested.
    pub telemetry_lookback_days: u32,
    /// Longest time range a single query may cover.
    pub max_range_days: u32,
    pub non_success_policy: NonSuccessPolicy,
    pub wide_table_layout: WideTableLayout,
    /// Deadline for a whole query, fetches included.
    pub query_timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_page_count: 20,
            telemetry_lookback_days: 90,
            max_range_days: 90,
            non_success_policy: NonSuccessPolicy::default(),
            wide_table_layout: WideTableLayout::default(),
            query_timeout_secs: None,
        }
    }
}

impl EngineConfig {
    pub fn telemetry_lookback(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.telemetry_lookback_days))
    }

    pub fn max_range(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.max_range_days))
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiConfig,
    pub engine: EngineConfig,
}

impl Settings {
    /// Load settings from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Environment::with_prefix("MONWATCH").separator("__"))
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder.add_source(env.try_parsing(true)).build()?;
        let settings: Self = config.try_deserialize()?;
        if settings.engine.max_page_count < 1 {
            bail!("engine.max_page_count must be at least 1");
        }
        Ok(settings)
    }
}
