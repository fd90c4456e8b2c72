//! # monwatch-adapters
//!
//! Client side of the monitoring API used by the monwatch query engine.
//!
//! The engine only sees the [`MonitorApi`] trait: one call per page of
//! records, plus the option lists used by query editors. Pagination,
//! concurrency and frame shaping all live above this crate.
//!
//! ## Features
//!
//! - `http` (default) - [`HttpMonitorApi`], a reqwest-based implementation
//!
//! ## Wire contract
//!
//! Record endpoints (`/monitor-error`, `/monitor-telemetry`,
//! `/status-page-changes`) take `from`, `to`, repeated `m[]`, optional `c[]`
//! and `i[]`, `only_shared=true` and `cursor_after`, and answer with
//! `{"entries": [...], "metadata": {"cursor_after": ...}}`. See
//! [`PageParams::query_pairs`] and [`decode_page`].

pub mod api;
pub mod error;

#[cfg(feature = "http")]
pub mod http;

pub use api::*;
pub use error::ApiError;

#[cfg(feature = "http")]
pub use http::{HttpMonitorApi, HttpMonitorApiBuilder, DEV_ENDPOINT, PROD_ENDPOINT};

// Re-export record types for convenience
pub use monwatch_types::{ErrorCount, StatusChange, Telemetry};
