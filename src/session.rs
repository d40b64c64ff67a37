//! Session seam for the consent step.
//!
//! The host owns session storage; the core only needs get/put/forget of a
//! small JSON payload keyed by session id. The pending authorization request
//! is parked under [`AUTH_REQUEST_KEY`] between GET /authorize and the
//! consent decision, and cleared unconditionally when the decision arrives.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::CodeChallengeMethod;

/// Session key holding the pending authorization request.
pub const AUTH_REQUEST_KEY: &str = "_oauth2_auth_request";

/// Host-provided session storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str, key: &str) -> Option<Value>;
    fn put(&self, session_id: &str, key: &str, value: Value);
    /// Remove and return the value, if any.
    fn forget(&self, session_id: &str, key: &str) -> Option<Value>;
}

/// In-memory store used by tests and the standalone binary.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str, key: &str) -> Option<Value> {
        self.inner
            .read()
            .expect("session store lock poisoned")
            .get(session_id)
            .and_then(|session| session.get(key).cloned())
    }

    fn put(&self, session_id: &str, key: &str, value: Value) {
        self.inner
            .write()
            .expect("session store lock poisoned")
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn forget(&self, session_id: &str, key: &str) -> Option<Value> {
        self.inner
            .write()
            .expect("session store lock poisoned")
            .get_mut(session_id)
            .and_then(|session| session.remove(key))
    }
}

/// The authenticated session the host attaches to authorization and
/// management requests: the session id for consent state, and the opaque
/// user value (string id, numeric id, or an object carrying `id`).
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub user: Value,
}

/// The validated authorization request parked in the session between the
/// authorize call and the consent decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub client_id: Uuid,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemorySessionStore::new();
        store.put("sid", "k", Value::from("v"));
        assert_eq!(store.get("sid", "k"), Some(Value::from("v")));
        assert_eq!(store.get("other", "k"), None);
        assert_eq!(store.get("sid", "other"), None);
    }

    #[test]
    fn forget_removes_and_returns() {
        let store = MemorySessionStore::new();
        store.put("sid", "k", Value::from(1));
        assert_eq!(store.forget("sid", "k"), Some(Value::from(1)));
        assert_eq!(store.forget("sid", "k"), None);
        assert_eq!(store.get("sid", "k"), None);
    }

    #[test]
    fn sessions_are_isolated() {
        let store = MemorySessionStore::new();
        store.put("a", "k", Value::from("a-value"));
        store.put("b", "k", Value::from("b-value"));
        store.forget("a", "k");
        assert_eq!(store.get("b", "k"), Some(Value::from("b-value")));
    }

    #[test]
    fn pending_authorization_survives_the_session_round_trip() {
        let pending = PendingAuthorization {
            client_id: Uuid::new_v4(),
            redirect_uri: "https://app/cb".to_string(),
            scopes: vec!["read".to_string()],
            state: Some("xyz".to_string()),
            code_challenge: Some("challenge".to_string()),
            code_challenge_method: Some(CodeChallengeMethod::S256),
        };

        let store = MemorySessionStore::new();
        store.put(
            "sid",
            AUTH_REQUEST_KEY,
            serde_json::to_value(&pending).unwrap(),
        );
        let restored: PendingAuthorization =
            serde_json::from_value(store.forget("sid", AUTH_REQUEST_KEY).unwrap()).unwrap();
        assert_eq!(restored, pending);
    }
}
