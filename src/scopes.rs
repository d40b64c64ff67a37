//! Scope registry.
//!
//! A name→description map seeded from configuration at boot and extendable
//! at runtime. Validation resolves a requested scope list to the effective
//! one: defaults are substituted for an empty request, every name must be
//! registered, and clients with an allow-list are confined to it. The
//! registry lives on the server state, one per process; writes are
//! synchronized behind the lock, readers may observe a stale snapshot.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::OAuthError;

/// A scope name with its human-readable description, as shown on consent
/// screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDescription {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Default)]
pub struct ScopeRegistry {
    scopes: RwLock<HashMap<String, String>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from a name→description map.
    pub fn from_map(scopes: &HashMap<String, String>) -> Self {
        let registry = Self::new();
        registry.define(scopes.iter().map(|(k, v)| (k.clone(), v.clone())));
        registry
    }

    /// Register a batch of scopes, overwriting descriptions of existing
    /// names.
    pub fn define<I>(&self, batch: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut scopes = self.scopes.write().expect("scope registry lock poisoned");
        for (name, description) in batch {
            scopes.insert(name, description);
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.scopes
            .read()
            .expect("scope registry lock poisoned")
            .contains_key(name)
    }

    /// Resolve the effective scope list for a request.
    ///
    /// An empty request substitutes `defaults`. Every resulting name must be
    /// registered and, when the client carries an allow-list, be a member of
    /// it. Input order is preserved for echo in responses.
    pub fn validate(
        &self,
        requested: &[String],
        client_allowed: Option<&[String]>,
        defaults: &[String],
    ) -> Result<Vec<String>, OAuthError> {
        let effective: Vec<String> = if requested.is_empty() {
            defaults.to_vec()
        } else {
            requested.to_vec()
        };

        let scopes = self.scopes.read().expect("scope registry lock poisoned");
        for name in &effective {
            if !scopes.contains_key(name) {
                return Err(OAuthError::InvalidScope(format!(
                    "Unknown scope '{}'",
                    name
                )));
            }
            if let Some(allowed) = client_allowed {
                if !allowed.iter().any(|a| a == name) {
                    return Err(OAuthError::InvalidScope(format!(
                        "Scope '{}' is not permitted for this client",
                        name
                    )));
                }
            }
        }

        Ok(effective)
    }

    /// Map names to display pairs. Unknown names pass through with the name
    /// as description; display never fails.
    pub fn describe(&self, names: &[String]) -> Vec<ScopeDescription> {
        let scopes = self.scopes.read().expect("scope registry lock poisoned");
        names
            .iter()
            .map(|name| ScopeDescription {
                name: name.clone(),
                description: scopes.get(name).cloned().unwrap_or_else(|| name.clone()),
            })
            .collect()
    }

    /// Drop every registered scope. Test-only escape hatch.
    #[cfg(test)]
    pub fn reset(&self) {
        self.scopes
            .write()
            .expect("scope registry lock poisoned")
            .clear();
    }
}

/// Split a space-separated `scope` parameter. A missing value, an empty
/// string, or one containing only spaces all mean "unspecified".
pub fn parse_scope_param(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ScopeRegistry {
        let registry = ScopeRegistry::new();
        registry.define([
            ("read".to_string(), "Read your data".to_string()),
            ("write".to_string(), "Modify your data".to_string()),
            ("admin".to_string(), "Administer the account".to_string()),
        ]);
        registry
    }

    fn s(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn empty_request_substitutes_defaults() {
        let r = registry();
        let effective = r.validate(&[], None, &s(&["read"])).unwrap();
        assert_eq!(effective, s(&["read"]));
    }

    #[test]
    fn empty_request_with_empty_defaults_yields_empty() {
        let r = registry();
        assert!(r.validate(&[], None, &[]).unwrap().is_empty());
    }

    #[test]
    fn unknown_scope_fails() {
        let r = registry();
        let err = r.validate(&s(&["read", "nope"]), None, &[]).unwrap_err();
        assert_eq!(err.error_code(), "invalid_scope");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn unknown_default_also_fails() {
        let r = registry();
        let err = r.validate(&[], None, &s(&["ghost"])).unwrap_err();
        assert_eq!(err.error_code(), "invalid_scope");
    }

    #[test]
    fn allow_list_confines_the_request() {
        let r = registry();
        let allowed = s(&["read"]);
        assert!(r.validate(&s(&["read"]), Some(&allowed), &[]).is_ok());
        let err = r
            .validate(&s(&["read", "write"]), Some(&allowed), &[])
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_scope");
        assert!(err.to_string().contains("write"));
    }

    #[test]
    fn null_allow_list_admits_any_registered_scope() {
        let r = registry();
        let effective = r
            .validate(&s(&["admin", "read", "write"]), None, &[])
            .unwrap();
        assert_eq!(effective, s(&["admin", "read", "write"]));
    }

    #[test]
    fn validation_preserves_input_order() {
        let r = registry();
        let effective = r.validate(&s(&["write", "read"]), None, &[]).unwrap();
        assert_eq!(effective, s(&["write", "read"]));
    }

    #[test]
    fn describe_echoes_unknown_names() {
        let r = registry();
        let described = r.describe(&s(&["read", "mystery"]));
        assert_eq!(described[0].description, "Read your data");
        assert_eq!(described[1].name, "mystery");
        assert_eq!(described[1].description, "mystery");
    }

    #[test]
    fn define_overwrites_existing_descriptions() {
        let r = registry();
        r.define([("read".to_string(), "Updated".to_string())]);
        assert_eq!(r.describe(&s(&["read"]))[0].description, "Updated");
    }

    #[test]
    fn reset_clears_everything() {
        let r = registry();
        r.reset();
        assert!(!r.is_defined("read"));
    }

    #[test]
    fn scope_param_parsing_treats_blank_as_unspecified() {
        assert!(parse_scope_param(None).is_empty());
        assert!(parse_scope_param(Some("")).is_empty());
        assert!(parse_scope_param(Some("   ")).is_empty());
        assert_eq!(
            parse_scope_param(Some("read  write")),
            s(&["read", "write"])
        );
    }
}
