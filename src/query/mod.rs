//! Query decoding, per-kind handlers and batch routing.
//!
//! - [`model`]: editor JSON and time windows
//! - [`handlers`]: one handler per record kind
//! - [`router`]: dispatch of a batch of queries by query type

pub mod handlers;
pub mod model;
pub mod router;

pub use handlers::QueryPhase;
pub use model::{MonitorQuery, TimeRange};
pub use router::{DataQuery, QueryDataRequest, QueryDataResponse, QueryType};
