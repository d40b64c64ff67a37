use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Grant types a client may be permitted to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered application that can obtain tokens.
///
/// A confidential client carries a secret digest; a public client has none
/// and must use PKCE for the authorization-code flow. `scopes` is an
/// allow-list; `None` means any registered scope may be requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub redirect_uris: Vec<String>,
    pub scopes: Option<Vec<String>>,
    pub grant_types: Vec<GrantType>,
    pub confidential: bool,
    pub first_party: bool,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row type for MySQL query results.
#[derive(Debug, Clone, FromRow)]
pub struct ClientRow {
    pub id: String,
    pub name: String,
    pub secret: Option<String>,
    pub redirect_uris: serde_json::Value,
    pub scopes: Option<serde_json::Value>,
    pub grant_types: serde_json::Value,
    pub confidential: bool,
    pub first_party: bool,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        let redirect_uris: Vec<String> =
            serde_json::from_value(row.redirect_uris).unwrap_or_default();
        let scopes: Option<Vec<String>> =
            row.scopes.and_then(|v| serde_json::from_value(v).ok());
        let grant_types: Vec<GrantType> =
            serde_json::from_value(row.grant_types).unwrap_or_default();

        Self {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            name: row.name,
            secret: row.secret,
            redirect_uris,
            scopes,
            grant_types,
            confidential: row.confidential,
            first_party: row.first_party,
            revoked: row.revoked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow> for Client {
    fn from_row(row: &'r sqlx::mysql::MySqlRow) -> Result<Self, sqlx::Error> {
        let client_row = ClientRow::from_row(row)?;
        Ok(Client::from(client_row))
    }
}

impl Client {
    pub fn is_public(&self) -> bool {
        !self.confidential
    }

    /// Byte-wise match against the registered URIs. No prefix matching.
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }

    pub fn allows_grant_type(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client {
            id: Uuid::new_v4(),
            name: "Test App".to_string(),
            secret: Some("00".repeat(32)),
            redirect_uris: vec!["https://app/cb".to_string()],
            scopes: None,
            grant_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
            confidential: true,
            first_party: false,
            revoked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn grant_type_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_value(GrantType::AuthorizationCode).unwrap(),
            "authorization_code"
        );
        let parsed: GrantType = serde_json::from_value("refresh_token".into()).unwrap();
        assert_eq!(parsed, GrantType::RefreshToken);
    }

    #[test]
    fn redirect_uri_match_is_exact() {
        let c = client();
        assert!(c.has_redirect_uri("https://app/cb"));
        assert!(!c.has_redirect_uri("https://app/cb/"));
        assert!(!c.has_redirect_uri("https://app"));
        assert!(!c.has_redirect_uri("https://evil/cb"));
    }

    #[test]
    fn grant_type_membership() {
        let c = client();
        assert!(c.allows_grant_type(GrantType::AuthorizationCode));
        assert!(c.allows_grant_type(GrantType::RefreshToken));
        assert!(!c.allows_grant_type(GrantType::ClientCredentials));
    }

    #[test]
    fn secret_is_never_serialized() {
        let json = serde_json::to_value(client()).unwrap();
        assert!(json.get("secret").is_none());
        assert!(json.get("name").is_some());
    }
}
