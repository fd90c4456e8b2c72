//! Per-query responses.

use std::fmt;

use monwatch_types::Frame;
use serde::Serialize;

/// Status attached to a failed query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    BadRequest,
    /// The upstream API answered with something unusable.
    ValidationFailed,
    Internal,
    BadGateway,
    Timeout,
}

impl ResponseStatus {
    /// HTTP-style status code.
    pub const fn code(self) -> u16 {
        match self {
            ResponseStatus::BadRequest => 400,
            ResponseStatus::ValidationFailed => 422,
            ResponseStatus::Internal => 500,
            ResponseStatus::BadGateway => 502,
            ResponseStatus::Timeout => 504,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseError {
    pub status: ResponseStatus,
    pub message: String,
}

/// The answer to one query: frames, or an error with no frames.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataResponse {
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl DataResponse {
    /// A successful response with no frames.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            error: None,
        }
    }

    pub fn error(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            frames: Vec::new(),
            error: Some(ResponseError {
                status,
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Number of graph frames.
    pub fn graph_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_graph()).count()
    }

    /// Number of wide table frames.
    pub fn table_frame_count(&self) -> usize {
        self.frames.len() - self.graph_frame_count()
    }
}
