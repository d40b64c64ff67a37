//! Protocol error taxonomy.
//!
//! Every failure surfaced by the token, authorization, revocation, and
//! introspection endpoints is one of the RFC 6749 error codes. Errors are
//! rendered as the standard JSON envelope; the authorization flow re-encodes
//! the same fields as redirect query parameters once the redirect URI has
//! been validated.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// A required parameter is missing or malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// Unknown, revoked, or unauthenticated client.
    #[error("Client authentication failed")]
    InvalidClient,

    /// The presented code or refresh token is absent, expired, revoked,
    /// or bound to different request parameters.
    #[error("{0}")]
    InvalidGrant(String),

    /// Unknown scope, or a scope outside the client's allow-list.
    #[error("{0}")]
    InvalidScope(String),

    #[error("Grant type not supported")]
    UnsupportedGrantType,

    /// The resource owner denied the authorization request.
    #[error("The resource owner denied the request")]
    AccessDenied,

    /// Escape hatch for storage failures and host misconfiguration.
    #[error("{0}")]
    ServerError(String),
}

impl OAuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::InvalidClient => "invalid_client",
            OAuthError::InvalidGrant(_) => "invalid_grant",
            OAuthError::InvalidScope(_) => "invalid_scope",
            OAuthError::UnsupportedGrantType => "unsupported_grant_type",
            OAuthError::AccessDenied => "access_denied",
            OAuthError::ServerError(_) => "server_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OAuthError::InvalidRequest(_)
            | OAuthError::InvalidGrant(_)
            | OAuthError::InvalidScope(_)
            | OAuthError::UnsupportedGrantType => StatusCode::BAD_REQUEST,
            OAuthError::InvalidClient => StatusCode::UNAUTHORIZED,
            OAuthError::AccessDenied => StatusCode::FORBIDDEN,
            OAuthError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        OAuthError::InvalidRequest(message.into())
    }

    pub fn missing_parameter(name: &str) -> Self {
        OAuthError::InvalidRequest(format!("{} is required", name))
    }
}

impl From<sqlx::Error> for OAuthError {
    fn from(err: sqlx::Error) -> Self {
        OAuthError::ServerError(format!("Database error: {}", err))
    }
}

/// RFC 6749 §5.2 error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub error_description: String,
}

impl From<&OAuthError> for ErrorBody {
    fn from(err: &OAuthError) -> Self {
        Self {
            error: err.error_code().to_string(),
            error_description: err.to_string(),
        }
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        if let OAuthError::ServerError(detail) = &self {
            tracing::error!(detail = %detail, "request failed with server_error");
        }
        let body = ErrorBody::from(&self);
        (self.status_code(), Json(body)).into_response()
    }
}
