//! Routing a batch of queries to their handlers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::model::TimeRange;
use crate::{DataResponse, QueryEngine, QueryError};

/// The record kind a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "GetMonitorErrors")]
    MonitorErrors,
    #[serde(rename = "GetMonitorTelemetry")]
    MonitorTelemetry,
    #[serde(rename = "GetMonitorStatusPageChanges")]
    MonitorStatusPageChanges,
}

impl QueryType {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::MonitorErrors => "GetMonitorErrors",
            QueryType::MonitorTelemetry => "GetMonitorTelemetry",
            QueryType::MonitorStatusPageChanges => "GetMonitorStatusPageChanges",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GetMonitorErrors" => Some(QueryType::MonitorErrors),
            "GetMonitorTelemetry" => Some(QueryType::MonitorTelemetry),
            "GetMonitorStatusPageChanges" => Some(QueryType::MonitorStatusPageChanges),
            _ => None,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One query of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub ref_id: String,
    /// Falls back to the JSON's `queryType` field when absent.
    #[serde(default)]
    pub query_type: Option<String>,
    pub json: Value,
    pub time_range: TimeRange,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>, json: Value, time_range: TimeRange) -> Self {
        Self {
            ref_id: ref_id.into(),
            query_type: None,
            json,
            time_range,
        }
    }

    pub fn with_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type.as_str().to_string());
        self
    }

    fn resolved_type(&self) -> Option<&str> {
        self.query_type
            .as_deref()
            .or_else(|| self.json.get("queryType").and_then(Value::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryDataRequest {
    pub queries: Vec<DataQuery>,
}

/// Responses keyed by ref id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryDataResponse {
    pub responses: BTreeMap<String, DataResponse>,
}

impl QueryEngine {
    /// Run every query of a batch. Each query gets its own response; one
    /// failing query never affects the others.
    pub async fn query_data(
        &self,
        request: QueryDataRequest,
        cancel: &CancellationToken,
    ) -> QueryDataResponse {
        debug!(queries = request.queries.len(), "Query batch received");
        let mut responses = BTreeMap::new();
        for query in request.queries {
            let response = self.route(&query, cancel).await;
            responses.insert(query.ref_id, response);
        }
        QueryDataResponse { responses }
    }

    async fn route(&self, query: &DataQuery, cancel: &CancellationToken) -> DataResponse {
        if let Err(err) = self.ensure_range_within_limit(&query.time_range) {
            warn!(ref_id = %query.ref_id, error = %err, "Rejecting query");
            return err.into_response();
        }

        let range = &query.time_range;
        match query.resolved_type().and_then(QueryType::parse) {
            Some(QueryType::MonitorErrors) => self.handle_errors_query(&query.json, range, cancel).await,
            Some(QueryType::MonitorTelemetry) => {
                self.handle_telemetry_query(&query.json, range, cancel).await
            }
            Some(QueryType::MonitorStatusPageChanges) => {
                self.handle_status_changes_query(&query.json, range, cancel)
                    .await
            }
            None => {
                debug!(ref_id = %query.ref_id, query_type = ?query.resolved_type(), "Unknown query type");
                DataResponse::empty()
            }
        }
    }

    /// Reject ranges longer than the limit, counted in whole hours.
    fn ensure_range_within_limit(&self, range: &TimeRange) -> Result<(), QueryError> {
        let hours = chrono::Duration::hours(range.duration().num_hours());
        if hours > self.config.max_range() {
            return Err(QueryError::TimeRange(format!(
                "time range cannot exceed {} days",
                self.config.max_range_days
            )));
        }
        Ok(())
    }
}
