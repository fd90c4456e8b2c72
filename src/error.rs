//! Error types for fetching and querying.

use monwatch_adapters::ApiError;
use thiserror::Error;

use crate::response::{DataResponse, ResponseStatus};

/// Errors from the paginator and fetch coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A page came back with a non-success status and the policy is to fail.
    #[error("API rejected page with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("fetch cancelled")]
    Cancelled,

    /// A fetch task panicked or was aborted.
    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Errors that end a query.
///
/// Every variant maps onto a [`ResponseStatus`], so a handler can always
/// answer with a [`DataResponse`] instead of failing past its boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Malformed query JSON or a missing required filter.
    #[error("{0}")]
    Validation(String),

    /// The requested window is outside what may be queried.
    #[error("{0}")]
    TimeRange(String),

    /// The request never produced a usable response.
    #[error("remote request error: {0}")]
    RemoteRequest(String),

    /// The API answered with a non-success status or an unreadable body.
    #[error("remote response error: {0}")]
    RemoteResponse(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("gateway timeout")]
    Timeout,

    #[error("{0}")]
    Internal(String),
}

impl QueryError {
    /// Status reported for this error.
    pub fn response_status(&self) -> ResponseStatus {
        match self {
            QueryError::Validation(_) | QueryError::TimeRange(_) => ResponseStatus::BadRequest,
            QueryError::RemoteRequest(_) => ResponseStatus::BadGateway,
            QueryError::RemoteResponse(_) => ResponseStatus::ValidationFailed,
            QueryError::Timeout => ResponseStatus::Timeout,
            QueryError::Cancelled | QueryError::Internal(_) => ResponseStatus::Internal,
        }
    }

    /// Message reported for this error. Upstream details stay in the logs.
    pub fn response_message(&self) -> String {
        match self {
            QueryError::RemoteRequest(_) => "bad gateway request".to_string(),
            QueryError::RemoteResponse(_) => "bad gateway response".to_string(),
            other => other.to_string(),
        }
    }

    pub fn into_response(self) -> DataResponse {
        DataResponse::error(self.response_status(), self.response_message())
    }
}

impl From<FetchError> for QueryError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Api(api) if api.is_transport() => QueryError::RemoteRequest(api.to_string()),
            FetchError::Api(api) => QueryError::RemoteResponse(api.to_string()),
            rejected @ FetchError::Rejected { .. } => QueryError::RemoteResponse(rejected.to_string()),
            FetchError::Cancelled => QueryError::Cancelled,
            FetchError::Task(msg) => QueryError::Internal(msg),
        }
    }
}
