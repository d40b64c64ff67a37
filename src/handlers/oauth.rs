//! Protocol endpoint handlers.
//!
//! - GET  /authorize  - authorization request (session user required)
//! - POST /authorize  - consent resolution
//! - POST /token      - token issuance across all grants
//! - POST /revoke     - RFC 7009 revocation
//! - POST /introspect - RFC 7662 introspection
//!
//! Handlers stay thin: parse the transport, call the engine, render the
//! outcome. The host's middleware is responsible for authenticating the
//! session user, CSRF on the consent post, and rate limiting.

use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;

use crate::config::AppState;
use crate::error::OAuthError;
use crate::handlers::extract::JsonOrForm;
use crate::services::{
    AuthorizePrompt, AuthorizeRequest, ConsentDecision, OAuthService, TokenIntentRequest,
    TokenRequest,
};
use crate::session::SessionContext;

/// GET /oauth/authorize
pub async fn get_authorize(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    Query(request): Query<AuthorizeRequest>,
) -> Response {
    let ctx = match require_session(session) {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };

    let engine = OAuthService::from_state(&state);
    match engine
        .begin_authorize(&request, &ctx, state.sessions.as_ref())
        .await
    {
        Ok(AuthorizePrompt::Redirect(location)) => found(&location),
        Ok(AuthorizePrompt::ConsentRequired {
            client,
            scopes,
            state: oauth_state,
        }) => {
            if let Some(page) = state.users.render_consent(&client, &scopes) {
                return Html(page).into_response();
            }
            Json(json!({
                "authorization_required": true,
                "client": { "id": client.id, "name": client.name },
                "scopes": scopes,
                "state": oauth_state,
            }))
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// POST /oauth/authorize
pub async fn post_authorize(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    JsonOrForm(decision): JsonOrForm<ConsentDecision>,
) -> Response {
    let ctx = match require_session(session) {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };

    let engine = OAuthService::from_state(&state);
    match engine
        .finish_authorize(&decision, &ctx, state.sessions.as_ref())
        .await
    {
        Ok(location) => found(&location),
        Err(err) => err.into_response(),
    }
}

/// POST /oauth/token
pub async fn post_token(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<TokenRequest>,
) -> Response {
    let engine = OAuthService::from_state(&state);
    match engine.token(&request).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /oauth/revoke
///
/// Always 200 with an empty object once a `token` parameter was present,
/// whatever the token turned out to be.
pub async fn post_revoke(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<TokenIntentRequest>,
) -> Response {
    let engine = OAuthService::from_state(&state);
    match engine.revoke(&request).await {
        Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /oauth/introspect
pub async fn post_introspect(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<TokenIntentRequest>,
) -> Response {
    let engine = OAuthService::from_state(&state);
    match engine.introspect(&request).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Authorization responses redirect with a plain 302.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// The host injects the authenticated session; its absence on these routes
/// is a wiring fault, not a protocol condition.
fn require_session(
    session: Option<Extension<SessionContext>>,
) -> Result<SessionContext, OAuthError> {
    session.map(|Extension(ctx)| ctx).ok_or_else(|| {
        OAuthError::ServerError("no authenticated session attached to the request".to_string())
    })
}
