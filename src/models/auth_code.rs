use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// PKCE challenge transformation (RFC 7636 §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    #[serde(rename = "S256")]
    S256,
    #[serde(rename = "plain")]
    Plain,
}

impl CodeChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeChallengeMethod::S256 => "S256",
            CodeChallengeMethod::Plain => "plain",
        }
    }

    /// Exact-match parse of the request parameter.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "S256" => Some(CodeChallengeMethod::S256),
            "plain" => Some(CodeChallengeMethod::Plain),
            _ => None,
        }
    }
}

/// A single-use credential authorizing one token exchange.
///
/// The lookup key is the SHA-256 hex digest of the code secret. `used_at`
/// doubles as the replay marker: once set, the row can never be consumed
/// again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub id: Uuid,
    pub client_id: Uuid,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub code: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<CodeChallengeMethod>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row type for MySQL query results.
#[derive(Debug, Clone, FromRow)]
pub struct AuthorizationCodeRow {
    pub id: String,
    pub client_id: String,
    pub user_id: String,
    pub code: String,
    pub redirect_uri: String,
    pub scopes: serde_json::Value,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AuthorizationCodeRow> for AuthorizationCode {
    fn from(row: AuthorizationCodeRow) -> Self {
        let scopes: Vec<String> = serde_json::from_value(row.scopes).unwrap_or_default();
        let code_challenge_method = row
            .code_challenge_method
            .as_deref()
            .and_then(CodeChallengeMethod::parse);

        Self {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            client_id: Uuid::parse_str(&row.client_id).unwrap_or_default(),
            user_id: row.user_id,
            code: row.code,
            redirect_uri: row.redirect_uri,
            scopes,
            code_challenge: row.code_challenge,
            code_challenge_method,
            expires_at: row.expires_at,
            used_at: row.used_at,
            created_at: row.created_at,
        }
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow> for AuthorizationCode {
    fn from_row(row: &'r sqlx::mysql::MySqlRow) -> Result<Self, sqlx::Error> {
        let code_row = AuthorizationCodeRow::from_row(row)?;
        Ok(AuthorizationCode::from(code_row))
    }
}

impl AuthorizationCode {
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn requires_pkce(&self) -> bool {
        self.code_challenge.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_exact() {
        assert_eq!(
            CodeChallengeMethod::parse("S256"),
            Some(CodeChallengeMethod::S256)
        );
        assert_eq!(
            CodeChallengeMethod::parse("plain"),
            Some(CodeChallengeMethod::Plain)
        );
        assert_eq!(CodeChallengeMethod::parse("s256"), None);
        assert_eq!(CodeChallengeMethod::parse("PLAIN"), None);
        assert_eq!(CodeChallengeMethod::parse(""), None);
    }

    #[test]
    fn method_serde_round_trip() {
        assert_eq!(
            serde_json::to_value(CodeChallengeMethod::S256).unwrap(),
            "S256"
        );
        assert_eq!(
            serde_json::to_value(CodeChallengeMethod::Plain).unwrap(),
            "plain"
        );
        let m: CodeChallengeMethod = serde_json::from_value("S256".into()).unwrap();
        assert_eq!(m, CodeChallengeMethod::S256);
    }
}
