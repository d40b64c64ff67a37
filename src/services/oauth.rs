//! Grant protocol engine.
//!
//! The state machine behind /authorize, /token, /revoke, and /introspect
//! across the authorization_code (with PKCE), client_credentials, and
//! refresh_token grants. Handlers parse the transport and delegate here;
//! this layer owns parameter validation, client authentication, and the
//! ordering rules that make the flows safe (redirect URIs are validated
//! before any error is sent through them, scope validation precedes the
//! session write, rotation revokes before reissue).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::config::{AppState, Config};
use crate::error::OAuthError;
use crate::events::{EventSink, OAuthEvent};
use crate::models::{Client, CodeChallengeMethod, GrantType, Token};
use crate::scopes::{parse_scope_param, ScopeDescription, ScopeRegistry};
use crate::services::auth_code::{AuthCodeService, NewAuthCode};
use crate::services::client::ClientService;
use crate::services::token::{IssuedToken, NewToken, TokenService};
use crate::session::{
    PendingAuthorization, SessionContext, SessionStore, AUTH_REQUEST_KEY,
};
use crate::users::resolve_user_id;

// ============================================================================
// Protocol requests and responses
// ============================================================================

/// Query parameters of GET /authorize. Everything is optional at the
/// transport layer; the engine reports which parameter is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// The consent decision posted back to /authorize. A missing `approved`
/// counts as denial.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsentDecision {
    #[serde(default)]
    pub approved: Option<bool>,
}

impl ConsentDecision {
    pub fn is_approved(&self) -> bool {
        self.approved.unwrap_or(false)
    }
}

/// Body of POST /token (RFC 6749 field names), JSON or form encoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Body of POST /revoke (RFC 7009) and POST /introspect (RFC 7662).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenIntentRequest {
    pub token: Option<String>,
    pub token_type_hint: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// RFC 6749 §5.1 success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    fn from_issued(issued: IssuedToken) -> Self {
        let expires_in = (issued.token.expires_at - chrono::Utc::now()).num_seconds();
        Self {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            scope: issued.token.scopes.join(" "),
            refresh_token: issued.refresh_token,
        }
    }
}

/// RFC 7662 §2.2 introspection envelope. Inactive tokens reveal nothing but
/// `active: false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl IntrospectionResponse {
    pub fn inactive() -> Self {
        Self {
            active: false,
            scope: None,
            client_id: None,
            token_type: None,
            exp: None,
            iat: None,
            sub: None,
        }
    }

    pub fn active(token: &Token) -> Self {
        Self {
            active: true,
            scope: Some(token.scopes.join(" ")),
            client_id: Some(token.client_id.to_string()),
            token_type: Some("Bearer".to_string()),
            exp: Some(token.expires_at.timestamp()),
            iat: Some(token.created_at.timestamp()),
            sub: token.user_id.clone(),
        }
    }
}

/// Outcome of GET /authorize once the request has survived validation.
#[derive(Debug)]
pub enum AuthorizePrompt {
    /// 302 target: either a freshly issued code (first-party client) or an
    /// error carried on the validated redirect URI.
    Redirect(String),
    /// The user must decide; the pending request is parked in the session.
    ConsentRequired {
        client: Client,
        scopes: Vec<ScopeDescription>,
        state: Option<String>,
    },
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone)]
pub struct OAuthService {
    clients: ClientService,
    codes: AuthCodeService,
    tokens: TokenService,
    registry: Arc<ScopeRegistry>,
    events: Arc<dyn EventSink>,
    config: Arc<Config>,
}

impl OAuthService {
    pub fn new(
        pool: MySqlPool,
        config: Arc<Config>,
        registry: Arc<ScopeRegistry>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            clients: ClientService::new(pool.clone()),
            codes: AuthCodeService::new(pool.clone(), config.clone()),
            tokens: TokenService::new(pool, config.clone()),
            registry,
            events,
            config,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.pool.clone(),
            state.config.clone(),
            state.scopes.clone(),
            state.events.clone(),
        )
    }

    // ------------------------------------------------------------------
    // GET /authorize
    // ------------------------------------------------------------------

    /// Validate an authorization request and either issue a code
    /// (first-party client), ask for consent, or fail.
    ///
    /// Failures before the redirect URI has been validated surface as
    /// `Err`, rendered as JSON; an unvalidated URI is never reflected in a
    /// redirect. Failures after validation ride the redirect URI. Scope
    /// validation runs before the session write so malformed requests leave
    /// no state behind.
    pub async fn begin_authorize(
        &self,
        request: &AuthorizeRequest,
        ctx: &SessionContext,
        sessions: &dyn SessionStore,
    ) -> Result<AuthorizePrompt, OAuthError> {
        if request.response_type.as_deref() != Some("code") {
            return Err(OAuthError::invalid_request(
                "response_type must be \"code\"",
            ));
        }
        let client_id = require(&request.client_id, "client_id")?;
        let client = self.load_client(client_id).await?;
        if !client.allows_grant_type(GrantType::AuthorizationCode) {
            return Err(OAuthError::invalid_request(
                "client is not permitted to use the authorization_code grant",
            ));
        }
        let redirect_uri = require(&request.redirect_uri, "redirect_uri")?;
        if !client.has_redirect_uri(redirect_uri) {
            return Err(OAuthError::invalid_request(
                "redirect_uri does not match any registered URI",
            ));
        }

        // The redirect URI is validated from here on; errors ride it back.
        let state = request.state.as_deref();
        let code_challenge = request
            .code_challenge
            .as_deref()
            .filter(|s| !s.is_empty());

        if client.is_public() && code_challenge.is_none() {
            return Ok(AuthorizePrompt::Redirect(error_redirect(
                redirect_uri,
                "invalid_request",
                "code_challenge is required for public clients",
                state,
            )));
        }

        let code_challenge_method = match code_challenge {
            None => None,
            Some(_) => match request.code_challenge_method.as_deref() {
                None => Some(CodeChallengeMethod::Plain),
                Some(raw) => match CodeChallengeMethod::parse(raw) {
                    Some(method) => Some(method),
                    None => {
                        return Ok(AuthorizePrompt::Redirect(error_redirect(
                            redirect_uri,
                            "invalid_request",
                            "code_challenge_method must be \"S256\" or \"plain\"",
                            state,
                        )))
                    }
                },
            },
        };

        let requested = parse_scope_param(request.scope.as_deref());
        let scopes = match self.registry.validate(
            &requested,
            client.scopes.as_deref(),
            &self.config.default_scopes,
        ) {
            Ok(scopes) => scopes,
            Err(err) => {
                return Ok(AuthorizePrompt::Redirect(error_redirect(
                    redirect_uri,
                    err.error_code(),
                    &err.to_string(),
                    state,
                )))
            }
        };

        let pending = PendingAuthorization {
            client_id: client.id,
            redirect_uri: redirect_uri.to_string(),
            scopes: scopes.clone(),
            state: request.state.clone(),
            code_challenge: code_challenge.map(String::from),
            code_challenge_method,
        };
        let payload = serde_json::to_value(&pending).map_err(|e| {
            OAuthError::ServerError(format!("Failed to serialize authorization request: {}", e))
        })?;
        sessions.put(&ctx.session_id, AUTH_REQUEST_KEY, payload);

        if client.first_party {
            let location = self.issue_code(&pending, &ctx.user).await?;
            let _ = sessions.forget(&ctx.session_id, AUTH_REQUEST_KEY);
            return Ok(AuthorizePrompt::Redirect(location));
        }

        let descriptions = self.registry.describe(&scopes);
        Ok(AuthorizePrompt::ConsentRequired {
            client,
            scopes: descriptions,
            state: pending.state,
        })
    }

    // ------------------------------------------------------------------
    // POST /authorize
    // ------------------------------------------------------------------

    /// Resolve the parked consent decision. The pending request is cleared
    /// unconditionally; denial redirects with `access_denied`, approval
    /// issues the code.
    pub async fn finish_authorize(
        &self,
        decision: &ConsentDecision,
        ctx: &SessionContext,
        sessions: &dyn SessionStore,
    ) -> Result<String, OAuthError> {
        let raw = sessions
            .forget(&ctx.session_id, AUTH_REQUEST_KEY)
            .ok_or_else(|| {
                OAuthError::invalid_request("no authorization request is in progress")
            })?;
        let pending: PendingAuthorization = serde_json::from_value(raw)
            .map_err(|_| OAuthError::invalid_request("stored authorization request is malformed"))?;

        if !decision.is_approved() {
            return Ok(error_redirect(
                &pending.redirect_uri,
                "access_denied",
                "The resource owner denied the request",
                pending.state.as_deref(),
            ));
        }

        self.issue_code(&pending, &ctx.user).await
    }

    /// Shared code issuance: bind the code to the session user and redirect
    /// back with `code` (and `state` when given).
    async fn issue_code(
        &self,
        pending: &PendingAuthorization,
        user: &Value,
    ) -> Result<String, OAuthError> {
        let user_id = resolve_user_id(user)?;
        let (plain, _) = self
            .codes
            .create(NewAuthCode {
                client_id: pending.client_id,
                user_id: user_id.clone(),
                redirect_uri: pending.redirect_uri.clone(),
                scopes: pending.scopes.clone(),
                code_challenge: pending.code_challenge.clone(),
                code_challenge_method: pending.code_challenge_method,
            })
            .await?;

        let mut params = vec![("code", plain.as_str())];
        if let Some(state) = pending.state.as_deref() {
            params.push(("state", state));
        }
        let location = append_query(&pending.redirect_uri, &params);

        self.events.emit(OAuthEvent::CodeIssued {
            client_id: pending.client_id,
            user_id,
        });
        Ok(location)
    }

    // ------------------------------------------------------------------
    // POST /token
    // ------------------------------------------------------------------

    pub async fn token(&self, request: &TokenRequest) -> Result<TokenResponse, OAuthError> {
        match request.grant_type.as_deref() {
            Some("authorization_code") => self.authorization_code_grant(request).await,
            Some("client_credentials") => self.client_credentials_grant(request).await,
            Some("refresh_token") => self.refresh_token_grant(request).await,
            Some(_) => Err(OAuthError::UnsupportedGrantType),
            None => Err(OAuthError::missing_parameter("grant_type")),
        }
    }

    async fn authorization_code_grant(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, OAuthError> {
        let code = require(&request.code, "code")?;
        let redirect_uri = require(&request.redirect_uri, "redirect_uri")?;
        let client_id = require(&request.client_id, "client_id")?;

        let client = self.load_client(client_id).await?;
        self.authenticate_confidential(&client, request.client_secret.as_deref())?;

        let consumed = self
            .codes
            .consume(
                code,
                client.id,
                redirect_uri,
                request.code_verifier.as_deref(),
            )
            .await?
            .ok_or_else(|| {
                OAuthError::InvalidGrant(
                    "authorization code is invalid, expired, or already used".to_string(),
                )
            })?;

        let issued = self
            .tokens
            .issue(NewToken {
                user_id: Some(consumed.user_id.clone()),
                client_id: client.id,
                name: None,
                scopes: consumed.scopes,
                with_refresh: client.allows_grant_type(GrantType::RefreshToken),
            })
            .await?;

        self.events.emit(OAuthEvent::TokenIssued {
            client_id: client.id,
            user_id: Some(consumed.user_id),
            grant_type: GrantType::AuthorizationCode,
        });
        Ok(TokenResponse::from_issued(issued))
    }

    async fn client_credentials_grant(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, OAuthError> {
        let client_id = require(&request.client_id, "client_id")?;
        let client_secret = require(&request.client_secret, "client_secret")?;

        let client = self.load_client(client_id).await?;
        if client.is_public() {
            return Err(OAuthError::InvalidClient);
        }
        if !client.allows_grant_type(GrantType::ClientCredentials) {
            return Err(OAuthError::InvalidGrant(
                "client is not permitted to use the client_credentials grant".to_string(),
            ));
        }
        if !self.clients.verify_secret(&client, client_secret) {
            return Err(OAuthError::InvalidClient);
        }

        let requested = parse_scope_param(request.scope.as_deref());
        let scopes = self.registry.validate(
            &requested,
            client.scopes.as_deref(),
            &self.config.default_scopes,
        )?;

        let issued = self
            .tokens
            .issue(NewToken {
                user_id: None,
                client_id: client.id,
                name: None,
                scopes,
                with_refresh: false,
            })
            .await?;

        self.events.emit(OAuthEvent::TokenIssued {
            client_id: client.id,
            user_id: None,
            grant_type: GrantType::ClientCredentials,
        });
        Ok(TokenResponse::from_issued(issued))
    }

    async fn refresh_token_grant(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, OAuthError> {
        let refresh_token = require(&request.refresh_token, "refresh_token")?;
        let client_id = require(&request.client_id, "client_id")?;

        // A client revoked since issuance fails here, before the token is
        // even looked up.
        let client = self.load_client(client_id).await?;
        self.authenticate_confidential(&client, request.client_secret.as_deref())?;

        let old = self
            .tokens
            .validate_refresh(refresh_token)
            .await?
            .filter(|token| token.client_id == client.id)
            .ok_or_else(|| {
                OAuthError::InvalidGrant(
                    "refresh token is invalid, expired, or revoked".to_string(),
                )
            })?;

        let scopes = match parse_scope_param(request.scope.as_deref()) {
            requested if requested.is_empty() => old.scopes.clone(),
            requested => {
                let widened = widened_scopes(&requested, &old.scopes);
                if !widened.is_empty() {
                    return Err(OAuthError::InvalidRequest(format!(
                        "requested scopes exceed the original grant: {}",
                        widened.join(", ")
                    )));
                }
                requested
            }
        };

        // Rotation: the old pair is dead before the new one exists, so the
        // old refresh token cannot be replayed even if issuance fails.
        self.tokens.revoke(old.id).await?;

        let issued = self
            .tokens
            .issue(NewToken {
                user_id: old.user_id.clone(),
                client_id: client.id,
                name: None,
                scopes,
                with_refresh: true,
            })
            .await?;

        self.events.emit(OAuthEvent::TokenRefreshed {
            client_id: client.id,
            user_id: old.user_id,
        });
        Ok(TokenResponse::from_issued(issued))
    }

    // ------------------------------------------------------------------
    // POST /revoke (RFC 7009)
    // ------------------------------------------------------------------

    /// Revoke an access or refresh token. Succeeds whether or not the token
    /// exists; nothing about token existence leaks through the response.
    pub async fn revoke(&self, request: &TokenIntentRequest) -> Result<(), OAuthError> {
        let token = require(&request.token, "token")?;
        self.authenticate_optional(
            request.client_id.as_deref(),
            request.client_secret.as_deref(),
        )
        .await?;

        let found = match self.tokens.validate(token).await? {
            Some(found) => Some(found),
            None => self.tokens.validate_refresh(token).await?,
        };
        if let Some(found) = found {
            self.tokens.revoke(found.id).await?;
            self.events.emit(OAuthEvent::TokenRevoked {
                token_id: found.id,
                client_id: found.client_id,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // POST /introspect (RFC 7662)
    // ------------------------------------------------------------------

    pub async fn introspect(
        &self,
        request: &TokenIntentRequest,
    ) -> Result<IntrospectionResponse, OAuthError> {
        let token = require(&request.token, "token")?;
        self.authenticate_optional(
            request.client_id.as_deref(),
            request.client_secret.as_deref(),
        )
        .await?;

        Ok(match self.tokens.validate(token).await? {
            Some(found) => IntrospectionResponse::active(&found),
            None => IntrospectionResponse::inactive(),
        })
    }

    // ------------------------------------------------------------------
    // Client authentication helpers
    // ------------------------------------------------------------------

    async fn load_client(&self, client_id: &str) -> Result<Client, OAuthError> {
        let id = Uuid::parse_str(client_id).map_err(|_| OAuthError::InvalidClient)?;
        self.clients
            .find(id)
            .await?
            .filter(|client| !client.revoked)
            .ok_or(OAuthError::InvalidClient)
    }

    /// A confidential client must present and pass its secret; a public
    /// client has nothing to present.
    fn authenticate_confidential(
        &self,
        client: &Client,
        client_secret: Option<&str>,
    ) -> Result<(), OAuthError> {
        if !client.confidential {
            return Ok(());
        }
        let secret = client_secret
            .filter(|s| !s.is_empty())
            .ok_or(OAuthError::InvalidClient)?;
        if !self.clients.verify_secret(client, secret) {
            return Err(OAuthError::InvalidClient);
        }
        Ok(())
    }

    /// Conditional authentication for revoke/introspect: a supplied
    /// client_id must resolve to a live client, but the secret is only
    /// verified when one accompanies it (RFC 7009 permits unauthenticated
    /// attempts).
    async fn authenticate_optional(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<(), OAuthError> {
        let client_id = match client_id.filter(|s| !s.is_empty()) {
            Some(id) => id,
            None => return Ok(()),
        };
        let client = self.load_client(client_id).await?;
        if client.confidential {
            if let Some(secret) = client_secret.filter(|s| !s.is_empty()) {
                if !self.clients.verify_secret(&client, secret) {
                    return Err(OAuthError::InvalidClient);
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, OAuthError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuthError::missing_parameter(name))
}

/// Scopes in `requested` that the original grant never carried, in request
/// order.
fn widened_scopes(requested: &[String], granted: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|scope| !granted.contains(scope))
        .cloned()
        .collect()
}

/// Append query parameters to a URL, percent-encoding values and respecting
/// an existing query string.
pub fn append_query(url: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::from(url);
    let mut separator = if url.contains('?') { '&' } else { '?' };
    for (name, value) in params {
        out.push(separator);
        out.push_str(name);
        out.push('=');
        out.push_str(&urlencoding::encode(value));
        separator = '&';
    }
    out
}

/// Error response carried on a redirect URI that has already been validated
/// against the client's registered list. `state` is preserved verbatim.
pub fn error_redirect(
    redirect_uri: &str,
    error: &str,
    description: &str,
    state: Option<&str>,
) -> String {
    let mut params = vec![("error", error), ("error_description", description)];
    if let Some(state) = state {
        params.push(("state", state));
    }
    append_query(redirect_uri, &params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn s(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn token_row(
        user_id: Option<&str>,
        scopes: &[&str],
        refresh: bool,
    ) -> Token {
        let now = Utc::now();
        Token {
            id: Uuid::new_v4(),
            user_id: user_id.map(String::from),
            client_id: Uuid::new_v4(),
            name: None,
            scopes: s(scopes),
            token: "hash".to_string(),
            refresh_token: refresh.then(|| "rhash".to_string()),
            expires_at: now + Duration::hours(1),
            refresh_expires_at: refresh.then(|| now + Duration::days(30)),
            last_used_at: None,
            revoked_at: None,
            created_at: now,
        }
    }

    #[test]
    fn append_query_starts_fresh_or_continues() {
        assert_eq!(
            append_query("https://app/cb", &[("code", "abc")]),
            "https://app/cb?code=abc"
        );
        assert_eq!(
            append_query("https://app/cb?keep=1", &[("code", "abc"), ("state", "s")]),
            "https://app/cb?keep=1&code=abc&state=s"
        );
    }

    #[test]
    fn append_query_percent_encodes_values() {
        let url = append_query("https://app/cb", &[("state", "a b&c=d")]);
        assert_eq!(url, "https://app/cb?state=a%20b%26c%3Dd");
    }

    #[test]
    fn error_redirect_carries_code_description_and_state() {
        let url = error_redirect(
            "https://app/cb",
            "access_denied",
            "The resource owner denied the request",
            Some("xyz"),
        );
        assert!(url.starts_with("https://app/cb?error=access_denied&error_description="));
        assert!(url.ends_with("&state=xyz"));
    }

    #[test]
    fn error_redirect_omits_absent_state() {
        let url = error_redirect("https://app/cb", "invalid_scope", "Unknown scope 'x'", None);
        assert!(!url.contains("state="));
    }

    #[test]
    fn widened_scopes_lists_only_new_names_in_order() {
        let granted = s(&["read", "write"]);
        assert!(widened_scopes(&s(&["read"]), &granted).is_empty());
        assert!(widened_scopes(&s(&["write", "read"]), &granted).is_empty());
        assert_eq!(
            widened_scopes(&s(&["admin", "read", "audit"]), &granted),
            s(&["admin", "audit"])
        );
    }

    #[test]
    fn token_response_envelope_shape() {
        let issued = IssuedToken {
            access_token: "plain-access".to_string(),
            refresh_token: Some("plain-refresh".to_string()),
            token: token_row(Some("1"), &["read", "write"], true),
        };
        let response = TokenResponse::from_issued(issued);
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.scope, "read write");
        assert!(response.expires_in > 3590 && response.expires_in <= 3600);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["refresh_token"], "plain-refresh");
    }

    #[test]
    fn token_response_without_refresh_omits_the_field() {
        let issued = IssuedToken {
            access_token: "plain-access".to_string(),
            refresh_token: None,
            token: token_row(None, &["read"], false),
        };
        let json = serde_json::to_value(TokenResponse::from_issued(issued)).unwrap();
        assert!(json.get("refresh_token").is_none());
    }

    #[test]
    fn inactive_introspection_reveals_nothing() {
        let json = serde_json::to_value(IntrospectionResponse::inactive()).unwrap();
        assert_eq!(json, serde_json::json!({"active": false}));
    }

    #[test]
    fn active_introspection_reports_unix_seconds() {
        let token = token_row(Some("7"), &["read", "write"], false);
        let response = IntrospectionResponse::active(&token);
        assert!(response.active);
        assert_eq!(response.scope.as_deref(), Some("read write"));
        assert_eq!(response.token_type.as_deref(), Some("Bearer"));
        assert_eq!(response.sub.as_deref(), Some("7"));
        assert_eq!(response.exp, Some(token.expires_at.timestamp()));
        assert_eq!(response.iat, Some(token.created_at.timestamp()));
    }

    #[test]
    fn active_introspection_omits_sub_for_client_tokens() {
        let token = token_row(None, &[], false);
        let json = serde_json::to_value(IntrospectionResponse::active(&token)).unwrap();
        assert!(json.get("sub").is_none());
        assert_eq!(json["client_id"], token.client_id.to_string());
    }

    #[test]
    fn consent_decision_defaults_to_denial() {
        assert!(!ConsentDecision::default().is_approved());
        assert!(!ConsentDecision {
            approved: Some(false)
        }
        .is_approved());
        assert!(ConsentDecision {
            approved: Some(true)
        }
        .is_approved());
    }
}
