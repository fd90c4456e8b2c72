//! # monwatch
//!
//! A query engine for monitor telemetry. It pulls paginated records from the
//! monitoring API, merges the streams for a query, and reshapes them into
//! graph and table frames.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         QueryEngine                          │
//! │  ┌─────────┐   ┌─────────┐   ┌─────────────┐   ┌──────────┐  │
//! │  │ router  │──▶│handlers │──▶│    fetch    │──▶│MonitorApi│  │
//! │  │ (batch) │   │ (kind)  │   │(coordinator,│   │ (remote) │  │
//! │  └─────────┘   └────┬────┘   │ paginator)  │   └──────────┘  │
//! │                     │        └─────────────┘                 │
//! │                     ▼                                        │
//! │               ┌──────────┐                                   │
//! │               │  frames  │──▶ DataResponse                   │
//! │               └──────────┘                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`query`]**: query JSON decoding, the per-kind handlers and the
//!   batch router
//! - **[`fetch`]**: cursor-following pagination and concurrent fan-out with
//!   fail-fast cancellation
//! - **[`frames`]**: graph frames (one series each) and the wide table
//! - **[`resources`]** and **[`health`]**: option lists for query editors
//!   and the credential check
//! - **[`config`]**: layered settings for the API client and the engine
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use monwatch::config::Settings;
//! use monwatch::{QueryEngine, TimeRange};
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::load(None).unwrap();
//! let api = settings.api.build_client().unwrap();
//! let engine = QueryEngine::new(Arc::new(api), settings.engine);
//!
//! let response = engine
//!     .handle_errors_query(
//!         &json!({"monitors": ["awslambda"], "includeShared": true}),
//!         &TimeRange::last(chrono::Duration::hours(6)),
//!         &CancellationToken::new(),
//!     )
//!     .await;
//! println!("{} frames", response.frames.len());
//! # });
//! ```

pub mod config;
pub mod duration;
pub mod fetch;
pub mod frames;
pub mod health;
pub mod query;
pub mod resources;

mod engine;
mod error;
mod response;

#[cfg(test)]
mod test_support;

pub use engine::QueryEngine;
pub use error::{FetchError, QueryError};
pub use health::{HealthCheckResult, HealthStatus};
pub use query::{
    DataQuery, MonitorQuery, QueryDataRequest, QueryDataResponse, QueryPhase, QueryType,
    TimeRange,
};
pub use resources::{ResourceResponse, SelectOption};
pub use response::{DataResponse, ResponseError, ResponseStatus};

// Re-export the building blocks for library consumers
pub use monwatch_adapters::{ApiError, HttpMonitorApi, MonitorApi};
pub use monwatch_types::{ErrorCount, Frame, FrameRecord, StatusChange, StatusMap, Telemetry};
