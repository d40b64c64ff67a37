use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An issued access token, with its optional refresh token in the same row.
///
/// `token` and `refresh_token` hold SHA-256 hex digests of the secrets that
/// were handed out; the plaintext never reaches storage. `user_id` is null
/// for client-credentials tokens, and a refresh digest is only ever present
/// alongside a user id and a refresh expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub client_id: Uuid,
    pub name: Option<String>,
    pub scopes: Vec<String>,
    #[serde(skip_serializing)]
    pub token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row type for MySQL query results.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub id: String,
    pub user_id: Option<String>,
    pub client_id: String,
    pub name: Option<String>,
    pub scopes: serde_json::Value,
    pub token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<TokenRow> for Token {
    fn from(row: TokenRow) -> Self {
        let scopes: Vec<String> = serde_json::from_value(row.scopes).unwrap_or_default();

        Self {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            user_id: row.user_id,
            client_id: Uuid::parse_str(&row.client_id).unwrap_or_default(),
            name: row.name,
            scopes,
            token: row.token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
            refresh_expires_at: row.refresh_expires_at,
            last_used_at: row.last_used_at,
            revoked_at: row.revoked_at,
            created_at: row.created_at,
        }
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow> for Token {
    fn from_row(row: &'r sqlx::mysql::MySqlRow) -> Result<Self, sqlx::Error> {
        let token_row = TokenRow::from_row(row)?;
        Ok(Token::from(token_row))
    }
}

impl Token {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// A token is expired at the boundary instant itself.
    pub fn access_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn refresh_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.refresh_expires_at {
            Some(at) => at <= now,
            None => true,
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Required scopes the token does not carry, in the order requested.
    pub fn missing_scopes<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|s| !self.has_scope(s))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_at: DateTime<Utc>) -> Token {
        Token {
            id: Uuid::new_v4(),
            user_id: Some("42".to_string()),
            client_id: Uuid::new_v4(),
            name: None,
            scopes: vec!["read".to_string(), "write".to_string()],
            token: "aa".repeat(32),
            refresh_token: None,
            expires_at,
            refresh_expires_at: None,
            last_used_at: None,
            revoked_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn access_expiry_is_inclusive_at_the_boundary() {
        let now = Utc::now();
        assert!(token(now).access_expired_at(now));
        assert!(token(now - Duration::seconds(1)).access_expired_at(now));
        assert!(!token(now + Duration::seconds(1)).access_expired_at(now));
    }

    #[test]
    fn refresh_expiry_without_refresh_token_counts_as_expired() {
        let now = Utc::now();
        let mut t = token(now + Duration::hours(1));
        assert!(t.refresh_expired_at(now));
        t.refresh_expires_at = Some(now + Duration::hours(1));
        assert!(!t.refresh_expired_at(now));
        t.refresh_expires_at = Some(now);
        assert!(t.refresh_expired_at(now));
    }

    #[test]
    fn missing_scopes_preserves_request_order() {
        let t = token(Utc::now());
        let required = vec![
            "admin".to_string(),
            "read".to_string(),
            "audit".to_string(),
        ];
        assert_eq!(t.missing_scopes(&required), vec!["admin", "audit"]);
        assert!(t
            .missing_scopes(&["read".to_string(), "write".to_string()])
            .is_empty());
    }

    #[test]
    fn digests_are_never_serialized() {
        let json = serde_json::to_value(token(Utc::now())).unwrap();
        assert!(json.get("token").is_none());
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("scopes").is_some());
    }
}
