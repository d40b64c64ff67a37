//! Client persistence.

use chrono::Utc;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::error::OAuthError;
use crate::models::{Client, GrantType};

const CLIENT_COLUMNS: &str = "id, name, secret, redirect_uris, scopes, grant_types, \
     confidential, first_party, revoked, created_at, updated_at";

#[derive(Clone)]
pub struct ClientRepository {
    pool: MySqlPool,
}

impl ClientRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a fully-formed client row.
    pub async fn insert(&self, client: &Client) -> Result<(), OAuthError> {
        let redirect_uris = serde_json::to_value(&client.redirect_uris)
            .map_err(|e| OAuthError::ServerError(format!("Failed to serialize redirect URIs: {}", e)))?;
        let scopes = client
            .scopes
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| OAuthError::ServerError(format!("Failed to serialize scopes: {}", e)))?;
        let grant_types = serde_json::to_value(&client.grant_types)
            .map_err(|e| OAuthError::ServerError(format!("Failed to serialize grant types: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO clients
            (id, name, secret, redirect_uris, scopes, grant_types,
             confidential, first_party, revoked, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(client.id.to_string())
        .bind(&client.name)
        .bind(&client.secret)
        .bind(&redirect_uris)
        .bind(&scopes)
        .bind(&grant_types)
        .bind(client.confidential)
        .bind(client.first_party)
        .bind(client.revoked)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a client regardless of revoked status; callers check `revoked`
    /// themselves.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, OAuthError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE id = ?",
            CLIENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// List clients newest-first, optionally including revoked rows.
    pub async fn list(&self, include_revoked: bool) -> Result<Vec<Client>, OAuthError> {
        let query = if include_revoked {
            format!(
                "SELECT {} FROM clients ORDER BY created_at DESC",
                CLIENT_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM clients WHERE revoked = FALSE ORDER BY created_at DESC",
                CLIENT_COLUMNS
            )
        };
        let clients = sqlx::query_as::<_, Client>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    /// Mark a client revoked. Re-revoking an already revoked client is a
    /// no-op.
    pub async fn revoke(&self, id: Uuid) -> Result<(), OAuthError> {
        sqlx::query(
            r#"
            UPDATE clients
            SET revoked = TRUE, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Hard delete, cascading through codes and tokens first.
    pub async fn delete(&self, id: Uuid) -> Result<(), OAuthError> {
        sqlx::query("DELETE FROM auth_codes WHERE client_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM tokens WHERE client_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Assemble a client row from creation inputs; persistence-agnostic so the
/// invariants stay testable.
pub fn build_client(
    name: String,
    secret_hash: Option<String>,
    redirect_uris: Vec<String>,
    scopes: Option<Vec<String>>,
    grant_types: Vec<GrantType>,
    confidential: bool,
    first_party: bool,
) -> Client {
    let now = Utc::now();
    Client {
        id: Uuid::new_v4(),
        name,
        secret: secret_hash,
        redirect_uris,
        scopes,
        grant_types,
        confidential,
        first_party,
        revoked: false,
        created_at: now,
        updated_at: now,
    }
}
