//! Token persistence.
//!
//! Lookups are by SHA-256 hex digest; the "valid" variants fold revocation
//! and expiry into the query so callers never see a dead row. Revocation is
//! a conditional update that leaves `revoked_at` untouched once set.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::error::OAuthError;
use crate::models::Token;

const TOKEN_COLUMNS: &str = "id, user_id, client_id, name, scopes, token, refresh_token, \
     expires_at, refresh_expires_at, last_used_at, revoked_at, created_at";

#[derive(Clone)]
pub struct TokenRepository {
    pool: MySqlPool,
}

impl TokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, token: &Token) -> Result<(), OAuthError> {
        let scopes = serde_json::to_value(&token.scopes)
            .map_err(|e| OAuthError::ServerError(format!("Failed to serialize scopes: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO tokens
            (id, user_id, client_id, name, scopes, token, refresh_token,
             expires_at, refresh_expires_at, last_used_at, revoked_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.to_string())
        .bind(&token.user_id)
        .bind(token.client_id.to_string())
        .bind(&token.name)
        .bind(&scopes)
        .bind(&token.token)
        .bind(&token.refresh_token)
        .bind(token.expires_at)
        .bind(token.refresh_expires_at)
        .bind(token.last_used_at)
        .bind(token.revoked_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Token>, OAuthError> {
        let token = sqlx::query_as::<_, Token>(&format!(
            "SELECT {} FROM tokens WHERE id = ?",
            TOKEN_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Live access token by digest: not revoked, access expiry strictly in
    /// the future (a token at its boundary instant is already dead).
    pub async fn find_valid_by_access_hash(
        &self,
        access_hash: &str,
    ) -> Result<Option<Token>, OAuthError> {
        let token = sqlx::query_as::<_, Token>(&format!(
            r#"
            SELECT {}
            FROM tokens
            WHERE token = ? AND revoked_at IS NULL AND expires_at > NOW(6)
            "#,
            TOKEN_COLUMNS
        ))
        .bind(access_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Live refresh token by digest.
    pub async fn find_valid_by_refresh_hash(
        &self,
        refresh_hash: &str,
    ) -> Result<Option<Token>, OAuthError> {
        let token = sqlx::query_as::<_, Token>(&format!(
            r#"
            SELECT {}
            FROM tokens
            WHERE refresh_token = ?
              AND revoked_at IS NULL
              AND refresh_expires_at IS NOT NULL
              AND refresh_expires_at > NOW(6)
            "#,
            TOKEN_COLUMNS
        ))
        .bind(refresh_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Record a successful validation. Fired from a background task; losing
    /// an update is acceptable.
    pub async fn touch_last_used(&self, id: Uuid) -> Result<(), OAuthError> {
        sqlx::query("UPDATE tokens SET last_used_at = NOW(6) WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Set `revoked_at` once. Idempotent: an already revoked row keeps its
    /// original timestamp.
    pub async fn revoke(&self, id: Uuid) -> Result<(), OAuthError> {
        sqlx::query(
            r#"
            UPDATE tokens
            SET revoked_at = NOW(6)
            WHERE id = ? AND revoked_at IS NULL
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, OAuthError> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET revoked_at = NOW(6)
            WHERE user_id = ? AND revoked_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn revoke_all_for_user_client(
        &self,
        user_id: &str,
        client_id: Uuid,
    ) -> Result<u64, OAuthError> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET revoked_at = NOW(6)
            WHERE user_id = ? AND client_id = ? AND revoked_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(client_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Live tokens for a user, newest first.
    pub async fn list_live_for_user(&self, user_id: &str) -> Result<Vec<Token>, OAuthError> {
        let tokens = sqlx::query_as::<_, Token>(&format!(
            r#"
            SELECT {}
            FROM tokens
            WHERE user_id = ? AND revoked_at IS NULL AND expires_at > NOW(6)
            ORDER BY created_at DESC
            "#,
            TOKEN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    /// Live tokens for a user, filtered to one client, newest first.
    pub async fn list_live_for_user_client(
        &self,
        user_id: &str,
        client_id: Uuid,
    ) -> Result<Vec<Token>, OAuthError> {
        let tokens = sqlx::query_as::<_, Token>(&format!(
            r#"
            SELECT {}
            FROM tokens
            WHERE user_id = ? AND client_id = ?
              AND revoked_at IS NULL AND expires_at > NOW(6)
            ORDER BY created_at DESC
            "#,
            TOKEN_COLUMNS
        ))
        .bind(user_id)
        .bind(client_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    /// Delete rows that can never validate again: access expired with no
    /// refresh half, refresh expired, or revoked longer ago than the
    /// retention window.
    pub async fn prune(&self, revoked_before: DateTime<Utc>) -> Result<u64, OAuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tokens
            WHERE (expires_at < NOW(6) AND refresh_token IS NULL)
               OR (refresh_expires_at IS NOT NULL AND refresh_expires_at < NOW(6))
               OR (revoked_at IS NOT NULL AND revoked_at < ?)
            "#,
        )
        .bind(revoked_before)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
