//! Error types shared by the assistant client, the tool layer and the server.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors produced while driving an assistant conversation.
#[derive(Error, Debug)]
pub enum AppError {
    /// A conversation resource was used before it was created.
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    /// The assistant service answered with a non-success status.
    #[error("assistant service error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body returned by the service.
        message: String,
    },

    /// HTTP transport failure talking to the assistant service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid service URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The run asked for a function that no handler is registered for.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A registered tool handler failed.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Function name of the failing tool.
        name: String,
        /// Handler error message.
        message: String,
    },

    /// The news search request could not be performed.
    #[error("error occurred during news API request: {0}")]
    NewsRequest(#[source] reqwest::Error),

    /// The run reached a terminal status other than `completed`.
    #[error("run {run_id} ended with status '{status}'{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    RunFailed {
        run_id: String,
        status: String,
        message: Option<String>,
    },

    /// The run did not complete before the wait deadline.
    #[error("run {run_id} did not complete within {timeout:?}")]
    RunTimedOut { run_id: String, timeout: Duration },

    /// The wait for the run was cancelled.
    #[error("wait for run {run_id} was cancelled")]
    Cancelled { run_id: String },

    /// The thread holds no readable assistant reply.
    #[error("thread {0} has no text message")]
    EmptyThread(String),
}

impl AppError {
    /// Whether the assistant service reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(name: "request.failed", error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
