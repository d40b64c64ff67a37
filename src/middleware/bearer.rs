//! Bearer guard for protected resource routes.
//!
//! Validates `Authorization: Bearer` headers against the token store,
//! resolves the owning user through the host's directory, and attaches the
//! authenticated context to the request. Scope enforcement is a separate
//! layer stacked on top.
//!
//! ```rust,ignore
//! use axum::{middleware, routing::get, Router};
//! use oauth2_server::middleware::{bearer_guard, require_scopes};
//!
//! let api = Router::new()
//!     .route("/notes", get(list_notes))
//!     .layer(middleware::from_fn(require_scopes(vec!["notes.read".into()])))
//!     .layer(middleware::from_fn_with_state(state.clone(), bearer_guard));
//! ```

use std::pin::Pin;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::config::AppState;
use crate::models::{Client, Token};
use crate::repositories::ClientRepository;
use crate::services::TokenService;

/// What the guard attaches to the request on success.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Resolved user value; `None` for client-credentials tokens.
    pub user: Option<Value>,
    /// The validated token row.
    pub token: Token,
    /// The issuing client, when it still exists.
    pub client: Option<Client>,
}

#[derive(Debug)]
pub enum BearerError {
    /// No usable `Authorization: Bearer` header.
    Unauthenticated,
    /// The presented token failed validation, or its user is gone.
    InvalidToken,
}

#[derive(Serialize)]
struct BearerErrorBody {
    error: &'static str,
}

impl IntoResponse for BearerError {
    fn into_response(self) -> Response {
        let error = match self {
            BearerError::Unauthenticated => "unauthenticated",
            BearerError::InvalidToken => "invalid_token",
        };
        (StatusCode::UNAUTHORIZED, Json(BearerErrorBody { error })).into_response()
    }
}

/// Admit requests carrying a live access token.
pub async fn bearer_guard(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, BearerError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(BearerError::Unauthenticated)?;
    let plain = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(BearerError::Unauthenticated)?;

    let tokens = TokenService::new(state.pool.clone(), state.config.clone());
    let token = tokens
        .validate(plain)
        .await
        .map_err(|_| BearerError::InvalidToken)?
        .ok_or(BearerError::InvalidToken)?;

    // A token whose user has disappeared is as dead as a revoked one.
    let user = match token.user_id.as_deref() {
        Some(user_id) => Some(
            state
                .users
                .find_by_id(user_id)
                .await
                .map_err(|_| BearerError::InvalidToken)?
                .ok_or(BearerError::InvalidToken)?,
        ),
        None => None,
    };

    let client = ClientRepository::new(state.pool.clone())
        .find_by_id(token.client_id)
        .await
        .ok()
        .flatten();

    request
        .extensions_mut()
        .insert(AuthContext {
            user,
            token,
            client,
        });
    Ok(next.run(request).await)
}

/// Layered scope enforcement. Reads the context attached by
/// [`bearer_guard`] and rejects requests whose token lacks any required
/// scope.
pub fn require_scopes(
    required: Vec<String>,
) -> impl Fn(
    Request<Body>,
    Next,
) -> Pin<Box<dyn std::future::Future<Output = Result<Response, ScopeError>> + Send>>
       + Clone
       + Send
       + 'static {
    move |request: Request<Body>, next: Next| {
        let required = required.clone();
        Box::pin(async move {
            let context = request
                .extensions()
                .get::<AuthContext>()
                .ok_or(ScopeError::MissingContext)?;

            let missing: Vec<String> = context
                .token
                .missing_scopes(&required)
                .into_iter()
                .map(String::from)
                .collect();
            if !missing.is_empty() {
                return Err(ScopeError::InsufficientScope { missing });
            }

            Ok(next.run(request).await)
        })
    }
}

#[derive(Debug)]
pub enum ScopeError {
    /// `require_scopes` ran without `bearer_guard` underneath.
    MissingContext,
    InsufficientScope { missing: Vec<String> },
}

impl IntoResponse for ScopeError {
    fn into_response(self) -> Response {
        match self {
            ScopeError::MissingContext => (
                StatusCode::UNAUTHORIZED,
                Json(BearerErrorBody {
                    error: "unauthenticated",
                }),
            )
                .into_response(),
            ScopeError::InsufficientScope { missing } => {
                #[derive(Serialize)]
                struct InsufficientScopeBody {
                    error: &'static str,
                    error_description: String,
                }
                (
                    StatusCode::FORBIDDEN,
                    Json(InsufficientScopeBody {
                        error: "insufficient_scope",
                        error_description: format!(
                            "Missing required scopes: {}",
                            missing.join(", ")
                        ),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_errors_are_401_with_bare_code() {
        let response = BearerError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = BearerError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn missing_scope_is_403() {
        let response = ScopeError::InsufficientScope {
            missing: vec!["write".to_string()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn scope_guard_without_bearer_guard_is_401() {
        let response = ScopeError::MissingContext.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
