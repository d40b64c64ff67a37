pub mod clients;
pub mod extract;
pub mod oauth;
pub mod personal_tokens;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use crate::config::AppState;
use crate::error::OAuthError;

/// Assemble the router under the configured prefix (default `/oauth`).
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route(
            "/authorize",
            get(oauth::get_authorize).post(oauth::post_authorize),
        )
        .route("/token", post(oauth::post_token))
        .route("/revoke", post(oauth::post_revoke))
        .route("/introspect", post(oauth::post_introspect))
        .route("/clients", get(clients::list).post(clients::create))
        .route("/clients/:id", delete(clients::destroy))
        .route(
            "/personal-tokens",
            get(personal_tokens::list).post(personal_tokens::create),
        )
        .route("/personal-tokens/:id", delete(personal_tokens::destroy));

    Router::new()
        .nest(&state.config.prefix, routes)
        .with_state(state)
}

/// Failures of the session-guarded management endpoints. Validation maps to
/// 422 rather than the protocol endpoints' 400.
#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    #[error("{0}")]
    Validation(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Internal(String),
}

impl From<OAuthError> for ManagementError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::ServerError(detail) => ManagementError::Internal(detail),
            other => ManagementError::Validation(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ManagementErrorBody {
    error: &'static str,
    error_description: String,
}

impl IntoResponse for ManagementError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ManagementError::Validation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request")
            }
            ManagementError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ManagementError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ManagementError::Internal(detail) => {
                tracing::error!(detail = %detail, "management request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error")
            }
        };
        let body = Json(ManagementErrorBody {
            error,
            error_description: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn management_error_statuses() {
        assert_eq!(
            ManagementError::Validation("x".into())
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ManagementError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ManagementError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ManagementError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn oauth_errors_map_into_management_classes() {
        let err: ManagementError = OAuthError::InvalidScope("Unknown scope 'x'".into()).into();
        assert!(matches!(err, ManagementError::Validation(_)));

        let err: ManagementError = OAuthError::ServerError("db gone".into()).into();
        assert!(matches!(err, ManagementError::Internal(_)));
    }
}
