//! The monitoring API as seen by the query engine.
//!
//! [`MonitorApi`] is the seam between the engine and the network: the HTTP
//! client implements it, and tests substitute scripted implementations.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use monwatch_types::{ErrorCount, StatusChange, Telemetry};

use crate::ApiError;

/// Parameters for one page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageParams {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Monitor logical names. Never empty for a valid query.
    pub monitors: Vec<String>,
    pub checks: Option<Vec<String>>,
    pub instances: Option<Vec<String>>,
    /// Fetch only data shared with this account.
    pub only_shared: bool,
    /// Continuation token from the previous page.
    pub cursor: Option<String>,
}

impl PageParams {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>, monitors: Vec<String>) -> Self {
        Self {
            from,
            to,
            monitors,
            checks: None,
            instances: None,
            only_shared: false,
            cursor: None,
        }
    }

    /// Restrict to checks. An empty list means no restriction.
    pub fn checks(mut self, checks: Option<Vec<String>>) -> Self {
        self.checks = checks.filter(|c| !c.is_empty());
        self
    }

    /// Restrict to instances. An empty list means no restriction.
    pub fn instances(mut self, instances: Option<Vec<String>>) -> Self {
        self.instances = instances.filter(|i| !i.is_empty());
        self
    }

    /// The shared-data variant of these parameters.
    pub fn shared(mut self) -> Self {
        self.only_shared = true;
        self
    }

    /// Query string pairs in wire order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("from", self.from.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            ("to", self.to.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        ];
        pairs.extend(self.monitors.iter().map(|m| ("m[]", m.clone())));
        if let Some(checks) = &self.checks {
            pairs.extend(checks.iter().map(|c| ("c[]", c.clone())));
        }
        if let Some(instances) = &self.instances {
            pairs.extend(instances.iter().map(|i| ("i[]", i.clone())));
        }
        if self.only_shared {
            pairs.push(("only_shared", "true".to_string()));
        }
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor_after", cursor.clone()));
        }
        pairs
    }
}

/// One page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub entries: Vec<T>,
    /// `None` when there are no further pages.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A final page.
    pub fn last(entries: Vec<T>) -> Self {
        Self {
            entries,
            next_cursor: None,
        }
    }

    pub fn with_cursor(entries: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            entries,
            next_cursor: Some(cursor.into()),
        }
    }
}

/// Outcome of a page fetch that reached the API.
///
/// A non-success status is not an [`ApiError`]: whether it ends the stream
/// or fails the query is the caller's policy.
#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse<T> {
    Page(Page<T>),
    NonSuccess { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    Paged {
        entries: Option<Vec<T>>,
        metadata: Option<PageMetadata>,
    },
    Bare(Vec<T>),
}

#[derive(Debug, Default, Deserialize)]
struct PageMetadata {
    #[serde(default)]
    cursor_after: Option<String>,
}

/// Decode a page body.
///
/// Accepts `{"entries": [...], "metadata": {"cursor_after": ...}}`, or a bare
/// array which is treated as the only page. An empty cursor string ends
/// pagination the same way a missing one does.
pub fn decode_page<T: DeserializeOwned>(body: &str) -> Result<Page<T>, ApiError> {
    let page = match serde_json::from_str::<PageBody<T>>(body)? {
        PageBody::Paged { entries, metadata } => Page {
            entries: entries.unwrap_or_default(),
            next_cursor: metadata
                .and_then(|m| m.cursor_after)
                .filter(|c| !c.is_empty()),
        },
        PageBody::Bare(entries) => Page::last(entries),
    };
    Ok(page)
}

/// A monitor visible to the account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub name: Option<String>,
    pub logical_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckInfo {
    pub name: Option<String>,
    pub logical_name: Option<String>,
}

/// The checks configured for one monitor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitorChecks {
    pub monitor_logical_name: Option<String>,
    #[serde(default)]
    pub checks: Option<Vec<CheckInfo>>,
}

/// The instances reporting for one monitor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitorInstances {
    pub monitor_logical_name: Option<String>,
    #[serde(default)]
    pub instances: Option<Vec<String>>,
}

/// Status of an auth verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub code: u16,
    /// Status line text, e.g. `403 Forbidden`.
    pub text: String,
}

/// Client for the monitoring API.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    async fn fetch_errors_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<ErrorCount>, ApiError>;

    async fn fetch_telemetry_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<Telemetry>, ApiError>;

    async fn fetch_status_changes_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<StatusChange>, ApiError>;

    async fn list_monitors(&self) -> Result<Vec<MonitorInfo>, ApiError>;

    async fn list_checks(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<MonitorChecks>, ApiError>;

    async fn list_instances(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<MonitorInstances>, ApiError>;

    /// Check the configured credentials.
    async fn verify_auth(&self) -> Result<AuthStatus, ApiError>;
}
