//! Authorization-code persistence.

use sqlx::MySqlPool;
use uuid::Uuid;

use crate::error::OAuthError;
use crate::models::AuthorizationCode;

const CODE_COLUMNS: &str = "id, client_id, user_id, code, redirect_uri, scopes, \
     code_challenge, code_challenge_method, expires_at, used_at, created_at";

#[derive(Clone)]
pub struct AuthCodeRepository {
    pool: MySqlPool,
}

impl AuthCodeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, code: &AuthorizationCode) -> Result<(), OAuthError> {
        let scopes = serde_json::to_value(&code.scopes)
            .map_err(|e| OAuthError::ServerError(format!("Failed to serialize scopes: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO auth_codes
            (id, client_id, user_id, code, redirect_uri, scopes,
             code_challenge, code_challenge_method, expires_at, used_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(code.id.to_string())
        .bind(code.client_id.to_string())
        .bind(&code.user_id)
        .bind(&code.code)
        .bind(&code.redirect_uri)
        .bind(&scopes)
        .bind(&code.code_challenge)
        .bind(code.code_challenge_method.map(|m| m.as_str()))
        .bind(code.expires_at)
        .bind(code.used_at)
        .bind(code.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Digest lookup scoped to the issuing client. Returns used and expired
    /// rows too; the lifecycle layer decides what they mean.
    pub async fn find_by_hash_for_client(
        &self,
        code_hash: &str,
        client_id: Uuid,
    ) -> Result<Option<AuthorizationCode>, OAuthError> {
        let code = sqlx::query_as::<_, AuthorizationCode>(&format!(
            "SELECT {} FROM auth_codes WHERE code = ? AND client_id = ?",
            CODE_COLUMNS
        ))
        .bind(code_hash)
        .bind(client_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    /// Claim a code for single use. The conditional update is the
    /// double-spend guard: of two racing exchanges, exactly one observes an
    /// affected row.
    pub async fn claim(&self, id: Uuid) -> Result<bool, OAuthError> {
        let result = sqlx::query(
            r#"
            UPDATE auth_codes
            SET used_at = NOW(6)
            WHERE id = ? AND used_at IS NULL
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Drop consumed and expired codes. Idempotent when nothing new appears.
    pub async fn prune(&self) -> Result<u64, OAuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_codes
            WHERE used_at IS NOT NULL OR expires_at < NOW(6)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
