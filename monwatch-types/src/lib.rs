//! # monwatch-types
//!
//! Core types for monitor telemetry queries. This crate defines the records
//! returned by the monitoring API and the tabular frames they are reshaped
//! into for display.
//!
//! ## Design Goals
//!
//! - **One extraction contract**: error counts, telemetry values and status
//!   page changes all implement [`FrameRecord`]
//! - **Typed columns**: frames carry typed value vectors, so a row that does
//!   not match its table layout is rejected instead of silently coerced
//! - **Optional serialization**: enable the `serde` feature to decode API
//!   payloads and encode frames as JSON
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use monwatch_types::{FrameRecord, StatusMap, Telemetry};
//!
//! let record = Telemetry {
//!     timestamp: Some("2022-12-07T18:28:06.485416Z".to_string()),
//!     value: Some(100.0),
//!     instance: Some("us-east-1".to_string()),
//!     check: Some("Check".to_string()),
//!     monitor_logical_name: Some("awslambda".to_string()),
//! };
//!
//! let statuses = StatusMap::default();
//! let ts = record.timestamp().unwrap();
//! let mut frame = record.graph_table_layout().unwrap();
//! frame.append_row(record.graph_row_values(ts, &statuses).unwrap()).unwrap();
//!
//! assert_eq!(frame.row_count(), 1);
//! assert_eq!(frame.fields[1].labels["monitor"], "awslambda");
//! ```

mod frame;
mod records;
mod status;

pub use frame::*;
pub use records::*;
pub use status::*;

/// Name of the timestamp column shared by every frame.
pub const TIME_FIELD: &str = "time";
