//! Authorization-code lifecycle.

use std::sync::Arc;

use chrono::Utc;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::OAuthError;
use crate::models::{AuthorizationCode, CodeChallengeMethod};
use crate::repositories::AuthCodeRepository;
use crate::utils::pkce::verify_challenge;
use crate::utils::secret::{generate_token_secret, hash_secret};

#[derive(Debug, Clone)]
pub struct NewAuthCode {
    pub client_id: Uuid,
    pub user_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

#[derive(Clone)]
pub struct AuthCodeService {
    repo: AuthCodeRepository,
    config: Arc<Config>,
}

impl AuthCodeService {
    pub fn new(pool: MySqlPool, config: Arc<Config>) -> Self {
        Self {
            repo: AuthCodeRepository::new(pool),
            config,
        }
    }

    /// Mint a code: 40 random bytes, handed out as hex exactly once, stored
    /// as a SHA-256 digest.
    pub async fn create(
        &self,
        params: NewAuthCode,
    ) -> Result<(String, AuthorizationCode), OAuthError> {
        let plain = generate_token_secret();
        let now = Utc::now();

        let code = AuthorizationCode {
            id: Uuid::new_v4(),
            client_id: params.client_id,
            user_id: params.user_id,
            code: hash_secret(&plain),
            redirect_uri: params.redirect_uri,
            scopes: params.scopes,
            code_challenge: params.code_challenge,
            code_challenge_method: params.code_challenge_method,
            expires_at: now + self.config.auth_code_ttl(),
            used_at: None,
            created_at: now,
        };
        self.repo.insert(&code).await?;

        Ok((plain, code))
    }

    /// Consume a code for a token exchange.
    ///
    /// Returns `None` with no side effects on any failure: unknown code,
    /// replay, expiry, redirect mismatch, or PKCE failure. Failure classes
    /// are deliberately indistinguishable. On success the row is claimed by
    /// a conditional update before being returned, so two racing exchanges
    /// of the same code can never both succeed.
    pub async fn consume(
        &self,
        plain: &str,
        client_id: Uuid,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<Option<AuthorizationCode>, OAuthError> {
        let code_hash = hash_secret(plain);
        let code = match self.repo.find_by_hash_for_client(&code_hash, client_id).await? {
            Some(code) => code,
            None => return Ok(None),
        };

        if code.is_used() || code.expired_at(Utc::now()) {
            return Ok(None);
        }
        if code.redirect_uri != redirect_uri {
            return Ok(None);
        }
        if !pkce_satisfied(&code, code_verifier) {
            return Ok(None);
        }

        if !self.repo.claim(code.id).await? {
            // A concurrent exchange claimed it between lookup and update.
            return Ok(None);
        }

        Ok(Some(AuthorizationCode {
            used_at: Some(Utc::now()),
            ..code
        }))
    }

    pub async fn prune(&self) -> Result<u64, OAuthError> {
        self.repo.prune().await
    }
}

/// PKCE gate: a stored challenge demands a matching verifier; a code issued
/// without one ignores any verifier sent.
fn pkce_satisfied(code: &AuthorizationCode, verifier: Option<&str>) -> bool {
    let challenge = match &code.code_challenge {
        Some(challenge) => challenge,
        None => return true,
    };
    let verifier = match verifier {
        Some(v) => v,
        None => return false,
    };
    let method = code
        .code_challenge_method
        .unwrap_or(CodeChallengeMethod::Plain);
    verify_challenge(verifier, challenge, method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::pkce::compute_s256_challenge;

    fn code_with_challenge(
        challenge: Option<&str>,
        method: Option<CodeChallengeMethod>,
    ) -> AuthorizationCode {
        let now = Utc::now();
        AuthorizationCode {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            user_id: "1".to_string(),
            code: "aa".repeat(32),
            redirect_uri: "https://app/cb".to_string(),
            scopes: vec!["read".to_string()],
            code_challenge: challenge.map(String::from),
            code_challenge_method: method,
            expires_at: now + chrono::Duration::minutes(10),
            used_at: None,
            created_at: now,
        }
    }

    #[test]
    fn no_challenge_means_no_pkce() {
        let code = code_with_challenge(None, None);
        assert!(pkce_satisfied(&code, None));
        assert!(pkce_satisfied(&code, Some("ignored-verifier-value")));
    }

    #[test]
    fn challenge_without_verifier_fails() {
        let code = code_with_challenge(Some("anything"), Some(CodeChallengeMethod::S256));
        assert!(!pkce_satisfied(&code, None));
        assert!(!pkce_satisfied(&code, Some("")));
    }

    #[test]
    fn s256_challenge_requires_matching_verifier() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = compute_s256_challenge(verifier);
        let code = code_with_challenge(Some(&challenge), Some(CodeChallengeMethod::S256));
        assert!(pkce_satisfied(&code, Some(verifier)));
        assert!(!pkce_satisfied(
            &code,
            Some("a_different_verifier_that_is_long_enough_to_pass")
        ));
    }

    #[test]
    fn plain_challenge_compares_directly() {
        let verifier = "a_plain_verifier_that_is_at_least_43_characters";
        let code = code_with_challenge(Some(verifier), Some(CodeChallengeMethod::Plain));
        assert!(pkce_satisfied(&code, Some(verifier)));
        assert!(!pkce_satisfied(
            &code,
            Some("some_other_plain_verifier_that_is_long_enough")
        ));
    }

    #[test]
    fn missing_method_defaults_to_plain() {
        let verifier = "a_plain_verifier_that_is_at_least_43_characters";
        let code = code_with_challenge(Some(verifier), None);
        assert!(pkce_satisfied(&code, Some(verifier)));
    }
}
