//! Personal access token endpoints (session-guarded).
//!
//! PATs are minted out-of-band against the configured first-party client,
//! typically for CLI use. The plaintext access token appears once in the
//! creation response and nowhere else.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::AppState;
use crate::error::OAuthError;
use crate::handlers::ManagementError;
use crate::models::Token;
use crate::services::TokenService;
use crate::session::SessionContext;
use crate::users::resolve_user_id;

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenCreatedResponse {
    #[serde(flatten)]
    pub token: Token,
    /// Plaintext access token, shown exactly once.
    pub access_token: String,
}

pub async fn list(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
) -> Result<Json<Vec<Token>>, ManagementError> {
    let user_id = session_user_id(&session)?;
    let tokens = TokenService::new(state.pool.clone(), state.config.clone())
        .personal_tokens_for(&user_id)
        .await?;
    Ok(Json(tokens))
}

pub async fn create(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenCreatedResponse>), ManagementError> {
    let user_id = session_user_id(&session)?;
    if request.name.trim().is_empty() {
        return Err(ManagementError::Validation("name is required".to_string()));
    }

    // Unknown scope names are a caller mistake, not a server fault.
    state
        .scopes
        .validate(&request.scopes, None, &[])
        .map_err(|err| ManagementError::Validation(err.to_string()))?;

    let issued = TokenService::new(state.pool.clone(), state.config.clone())
        .issue_personal(user_id, request.name, request.scopes)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenCreatedResponse {
            token: issued.token,
            access_token: issued.access_token,
        }),
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ManagementError> {
    let user_id = session_user_id(&session)?;

    let tokens = TokenService::new(state.pool.clone(), state.config.clone());
    let token = tokens.find(id).await?.ok_or(ManagementError::NotFound)?;
    // Only the owner may revoke, and only tokens of the personal client.
    let personal_client = state.config.personal_access_client;
    if token.user_id.as_deref() != Some(user_id.as_str())
        || personal_client != Some(token.client_id)
    {
        return Err(ManagementError::NotFound);
    }

    tokens.revoke(id).await?;
    Ok(Json(json!({})))
}

fn session_user_id(
    session: &Option<Extension<SessionContext>>,
) -> Result<String, ManagementError> {
    let ctx = session
        .as_ref()
        .map(|Extension(ctx)| ctx)
        .ok_or(ManagementError::Unauthenticated)?;
    resolve_user_id(&ctx.user).map_err(|err: OAuthError| match err {
        OAuthError::ServerError(detail) => ManagementError::Internal(detail),
        other => ManagementError::Validation(other.to_string()),
    })
}
