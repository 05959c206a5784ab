// src/error.rs

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Body used when an upstream failure carries no message of its own.
pub const GENERIC_UPSTREAM_MESSAGE: &str = "Server error";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("City is required")]
    InvalidInput,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Server misconfiguration: API key missing")]
    ServerMisconfiguration,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Failure of the outbound call to the generative-text service.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{0}")]
    Transport(String),

    #[error("{}", or_generic(.message))]
    Api { status: u16, message: Option<String> },

    #[error("{0}")]
    Malformed(String),

    #[error("{0}")]
    Blocked(String),

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),
}

fn or_generic(message: &Option<String>) -> &str {
    message
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(GENERIC_UPSTREAM_MESSAGE)
}

impl UpstreamError {
    /// The upstream's own message, if it sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            UpstreamError::Api { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            UpstreamError::Transport(m) | UpstreamError::Malformed(m) | UpstreamError::Blocked(m) => {
                Some(m.as_str()).filter(|m| !m.is_empty())
            }
            UpstreamError::Timeout(_) => None,
        }
    }

    /// HTTP status the upstream answered with, when it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            UpstreamError::Malformed(e.to_string())
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

// Allow Actix to convert our custom error into an HTTP response
impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServiceError::InvalidInput => StatusCode::BAD_REQUEST,
            ServiceError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::ServerMisconfiguration | ServiceError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::Upstream(UpstreamError::Timeout(_)) => self.to_string(),
            ServiceError::Upstream(e) => e
                .message()
                .unwrap_or(GENERIC_UPSTREAM_MESSAGE)
                .to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": message
        }))
    }
}
