//! User-directory seam.
//!
//! The user-account subsystem is a collaborator, not part of this crate.
//! It is consumed through [`UserDirectory`]: a lookup by id, an identifier
//! extractor, and an optional consent renderer. User values are opaque JSON;
//! the only thing the protocol ever needs from one is its identifier, and
//! [`resolve_user_id`] adapts the three shapes hosts hand us (string id,
//! numeric id, object carrying `id`).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::OAuthError;
use crate::models::Client;
use crate::scopes::ScopeDescription;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait UserDirectory: Send + Sync {
    /// Look up a user by the identifier stored on a token or code.
    fn find_by_id(&self, id: &str) -> BoxFuture<'_, Result<Option<Value>, OAuthError>>;

    /// Extract the identifier from an opaque user value.
    fn identifier_of(&self, user: &Value) -> Result<String, OAuthError> {
        resolve_user_id(user)
    }

    /// Render the consent page for a pending authorization. `None` falls
    /// back to the JSON consent payload.
    fn render_consent(
        &self,
        _client: &Client,
        _scopes: &[ScopeDescription],
    ) -> Option<String> {
        None
    }
}

/// Normalize an opaque user value to the string identifier persisted on
/// codes and tokens. Accepts a string, an integer, or an object with an
/// `id` member of either shape; anything else is a host configuration
/// error.
pub fn resolve_user_id(user: &Value) -> Result<String, OAuthError> {
    match user {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Value::Object(fields) => match fields.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            _ => Err(OAuthError::ServerError(
                "authenticated user object has no usable 'id'".to_string(),
            )),
        },
        _ => Err(OAuthError::ServerError(
            "cannot determine the authenticated user's identifier".to_string(),
        )),
    }
}

/// Fixed-map directory for tests and the standalone binary.
#[derive(Debug, Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, Value>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: impl Into<String>, user: Value) -> Self {
        self.users.insert(id.into(), user);
        self
    }
}

impl UserDirectory for StaticUserDirectory {
    fn find_by_id(&self, id: &str) -> BoxFuture<'_, Result<Option<Value>, OAuthError>> {
        let found = self.users.get(id).cloned();
        Box::pin(async move { Ok(found) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_string_ids() {
        assert_eq!(resolve_user_id(&json!("user-7")).unwrap(), "user-7");
    }

    #[test]
    fn resolves_numeric_ids() {
        assert_eq!(resolve_user_id(&json!(42)).unwrap(), "42");
    }

    #[test]
    fn resolves_object_ids_of_both_shapes() {
        assert_eq!(
            resolve_user_id(&json!({"id": "abc", "name": "A"})).unwrap(),
            "abc"
        );
        assert_eq!(resolve_user_id(&json!({"id": 9})).unwrap(), "9");
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(resolve_user_id(&json!(null)).is_err());
        assert!(resolve_user_id(&json!("")).is_err());
        assert!(resolve_user_id(&json!(true)).is_err());
        assert!(resolve_user_id(&json!({"name": "no id"})).is_err());
        assert!(resolve_user_id(&json!({"id": null})).is_err());
        assert!(resolve_user_id(&json!(1.5)).is_err());
    }

    #[tokio::test]
    async fn static_directory_lookup() {
        let directory =
            StaticUserDirectory::new().with_user("7", json!({"id": "7", "name": "Dev"}));
        let found = directory.find_by_id("7").await.unwrap();
        assert_eq!(found.unwrap()["name"], "Dev");
        assert!(directory.find_by_id("8").await.unwrap().is_none());
    }
}
