//! Client management endpoints (session-guarded).
//!
//! - GET    /clients     - list live clients
//! - POST   /clients     - register a client, returning its secret once
//! - DELETE /clients/:id - revoke a client

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::AppState;
use crate::handlers::ManagementError;
use crate::models::{Client, GrantType};
use crate::services::{ClientService, NewClient};
use crate::session::SessionContext;

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    /// Register without a secret; forces PKCE on the code flow.
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub first_party: bool,
    /// Register for the client_credentials grant instead of the code flow.
    #[serde(default)]
    pub credentials: bool,
}

#[derive(Debug, Serialize)]
pub struct ClientCreatedResponse {
    #[serde(flatten)]
    pub client: Client,
    /// Plaintext secret, shown exactly once. Absent for public clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
) -> Result<Json<Vec<Client>>, ManagementError> {
    require_session(&session)?;
    let clients = ClientService::new(state.pool.clone()).list().await?;
    Ok(Json(clients))
}

pub async fn create(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientCreatedResponse>), ManagementError> {
    require_session(&session)?;

    let grant_types = if request.credentials {
        vec![GrantType::ClientCredentials]
    } else {
        vec![GrantType::AuthorizationCode, GrantType::RefreshToken]
    };

    let (client, secret) = ClientService::new(state.pool.clone())
        .create(NewClient {
            name: request.name,
            redirect_uris: request.redirect_uris,
            scopes: request.scopes,
            grant_types: Some(grant_types),
            confidential: !request.public,
            first_party: request.first_party,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ClientCreatedResponse { client, secret }),
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ManagementError> {
    require_session(&session)?;

    let clients = ClientService::new(state.pool.clone());
    clients
        .find(id)
        .await?
        .ok_or(ManagementError::NotFound)?;
    clients.revoke(id).await?;
    Ok(Json(json!({})))
}

fn require_session(
    session: &Option<Extension<SessionContext>>,
) -> Result<&SessionContext, ManagementError> {
    session
        .as_ref()
        .map(|Extension(ctx)| ctx)
        .ok_or(ManagementError::Unauthenticated)
}
