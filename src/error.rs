//! Error taxonomy for the lifecycle core.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed or out-of-range input from the caller.
    #[error("{0}")]
    Validation(String),

    #[error("cluster '{id}' not found")]
    NotFound { id: String },

    /// A collaborator call (store, stack directory, notifier) failed.
    #[error("{0:#}")]
    Transport(#[from] anyhow::Error),

    /// A record did not finish processing within the sweep deadline.
    #[error("processing cluster '{id}' exceeded {limit:?}")]
    Timeout { id: String, limit: Duration },
}

impl LifecycleError {
    pub fn validation(message: impl Into<String>) -> Self {
        LifecycleError::Validation(message.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        LifecycleError::NotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LifecycleError::NotFound { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LifecycleError::Validation(_) => StatusCode::BAD_REQUEST,
            LifecycleError::NotFound { .. } => StatusCode::NOT_FOUND,
            LifecycleError::Transport(_) | LifecycleError::Timeout { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

pub type Result<T, E = LifecycleError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_status_codes() {
        assert_eq!(LifecycleError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(LifecycleError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        let transport: LifecycleError = anyhow::anyhow!("boom").into();
        assert_eq!(transport.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_transport_message_keeps_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset"));
        let err: LifecycleError = err.context("Failed to read cluster record").unwrap_err().into();
        assert_eq!(err.to_string(), "Failed to read cluster record: connection reset");
    }
}
