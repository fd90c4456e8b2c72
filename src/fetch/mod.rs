//! Paginated, concurrent record fetching.
//!
//! ## Submodules
//!
//! - [`paginator`]: follows one stream's cursors until exhaustion
//! - [`coordinator`]: runs several streams at once and fails fast
//!
//! ## Data Flow
//!
//! ```text
//! [PageParams; K] (own data, shared data)
//!        │
//!        ▼
//! FetchCoordinator::fetch_all()  ──▶ one task per stream, one slot per task
//!        │
//!        ▼
//! Paginator::fetch_all_pages()   ──▶ MonitorApi page calls, at most max_page_count
//!        │
//!        ▼
//! Vec<R> (stream order) ──▶ sort_by_timestamp()
//! ```

pub mod coordinator;
pub mod paginator;

pub use coordinator::FetchCoordinator;
pub use paginator::Paginator;

use futures::future::BoxFuture;
use monwatch_adapters::{ApiError, MonitorApi, PageParams, PageResponse};
use monwatch_types::{ErrorCount, FrameRecord, StatusChange, Telemetry};

/// A record kind that can be fetched page by page.
pub trait PagedRecord: FrameRecord + Send + Sync + Sized + 'static {
    /// Fetch one page of this kind of record.
    fn fetch_page<'a>(
        api: &'a dyn MonitorApi,
        params: &'a PageParams,
    ) -> BoxFuture<'a, Result<PageResponse<Self>, ApiError>>;
}

impl PagedRecord for ErrorCount {
    fn fetch_page<'a>(
        api: &'a dyn MonitorApi,
        params: &'a PageParams,
    ) -> BoxFuture<'a, Result<PageResponse<Self>, ApiError>> {
        api.fetch_errors_page(params)
    }
}

impl PagedRecord for Telemetry {
    fn fetch_page<'a>(
        api: &'a dyn MonitorApi,
        params: &'a PageParams,
    ) -> BoxFuture<'a, Result<PageResponse<Self>, ApiError>> {
        api.fetch_telemetry_page(params)
    }
}

impl PagedRecord for StatusChange {
    fn fetch_page<'a>(
        api: &'a dyn MonitorApi,
        params: &'a PageParams,
    ) -> BoxFuture<'a, Result<PageResponse<Self>, ApiError>> {
        api.fetch_status_changes_page(params)
    }
}

/// Stable sort by parsed timestamp, ascending.
///
/// Records with equal timestamps keep their relative order, so records from
/// earlier streams stay ahead of same-instant records from later ones.
/// Unparseable timestamps sort first; the frame builder drops them.
pub fn sort_by_timestamp<R: FrameRecord>(records: &mut [R]) {
    records.sort_by_cached_key(|record| record.timestamp().ok());
}
