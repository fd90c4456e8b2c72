//! One handler per record kind.
//!
//! Each handler runs `Validating → Fetching → Merging → Shaping → Done`;
//! validation and fetch failures move straight to `Failed`. Handlers never
//! return an error: failures become an error-flagged [`DataResponse`].

use std::fmt;

use chrono::Utc;
use monwatch_types::{ErrorCount, Frame, StatusChange, Telemetry};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::model::{MonitorQuery, TimeRange};
use crate::fetch::{sort_by_timestamp, PagedRecord};
use crate::frames::{apply_status_mappings, FrameBuilder};
use crate::{DataResponse, QueryEngine, QueryError};

/// Lifecycle of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Validating,
    Fetching,
    Merging,
    Shaping,
    Done,
    Failed,
}

impl fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryPhase::Validating => "validating",
            QueryPhase::Fetching => "fetching",
            QueryPhase::Merging => "merging",
            QueryPhase::Shaping => "shaping",
            QueryPhase::Done => "done",
            QueryPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl QueryEngine {
    /// Error counts per instance, check and monitor.
    pub async fn handle_errors_query(
        &self,
        json: &Value,
        range: &TimeRange,
        cancel: &CancellationToken,
    ) -> DataResponse {
        self.respond::<ErrorCount>(json, range, cancel, false).await
    }

    /// Response times per instance, check and monitor.
    ///
    /// Rejects windows starting further back than the telemetry lookback.
    pub async fn handle_telemetry_query(
        &self,
        json: &Value,
        range: &TimeRange,
        cancel: &CancellationToken,
    ) -> DataResponse {
        self.respond::<Telemetry>(json, range, cancel, true).await
    }

    /// Status page component changes, mapped onto the severity scale.
    pub async fn handle_status_changes_query(
        &self,
        json: &Value,
        range: &TimeRange,
        cancel: &CancellationToken,
    ) -> DataResponse {
        let mut response = self
            .respond::<StatusChange>(json, range, cancel, false)
            .await;
        apply_status_mappings(&mut response.frames, &self.statuses);
        response
    }

    async fn respond<R: PagedRecord>(
        &self,
        json: &Value,
        range: &TimeRange,
        cancel: &CancellationToken,
        enforce_lookback: bool,
    ) -> DataResponse {
        let run = self.run::<R>(json, range, cancel, enforce_lookback);
        let result = match self.config.query_timeout() {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or(Err(QueryError::Timeout)),
            None => run.await,
        };

        match result {
            Ok(frames) => {
                info!(kind = R::KIND, phase = %QueryPhase::Done, frames = frames.len(), "Query complete");
                DataResponse::with_frames(frames)
            }
            Err(err) => {
                warn!(kind = R::KIND, phase = %QueryPhase::Failed, error = %err, "Query failed");
                err.into_response()
            }
        }
    }

    async fn run<R: PagedRecord>(
        &self,
        json: &Value,
        range: &TimeRange,
        cancel: &CancellationToken,
        enforce_lookback: bool,
    ) -> Result<Vec<Frame>, QueryError> {
        debug!(kind = R::KIND, phase = %QueryPhase::Validating, "Validating query");
        let query = MonitorQuery::from_json(json)?;
        if enforce_lookback {
            self.ensure_within_lookback(range)?;
        }

        let variants = query.page_variants(range);
        debug!(kind = R::KIND, phase = %QueryPhase::Fetching, streams = variants.len(), "Fetching records");
        let mut records: Vec<R> = self.coordinator.fetch_all(variants, cancel).await?;

        debug!(kind = R::KIND, phase = %QueryPhase::Merging, records = records.len(), "Merging records");
        if records.is_empty() {
            return Ok(Vec::new());
        }
        sort_by_timestamp(&mut records);

        debug!(kind = R::KIND, phase = %QueryPhase::Shaping, "Building frames");
        let builder = FrameBuilder::new(&self.statuses, self.config.wide_table_layout);
        let mut frames = builder.build_graph_frames(&records);
        if frames.is_empty() {
            warn!(kind = R::KIND, records = records.len(), "Every record was dropped");
            return Ok(Vec::new());
        }
        if query.from_alerting {
            debug!(kind = R::KIND, "Alerting request, omitting wide frames");
        } else {
            frames.extend(builder.build_wide_frames(&records));
        }
        Ok(frames)
    }

    fn ensure_within_lookback(&self, range: &TimeRange) -> Result<(), QueryError> {
        let earliest = Utc::now() - self.config.telemetry_lookback();
        if range.from < earliest {
            return Err(QueryError::TimeRange(format!(
                "telemetry cannot be requested more than {} days in the past",
                self.config.telemetry_lookback_days
            )));
        }
        Ok(())
    }
}
