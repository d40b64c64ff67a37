//! Body extraction for the protocol endpoints.
//!
//! RFC 6749 prescribes form encoding but JSON clients are ubiquitous; the
//! token, revoke, and introspect bodies accept either, keyed off the
//! Content-Type header. Malformed bodies become `invalid_request` rather
//! than the framework's default rejection.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;

use crate::error::OAuthError;

pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = OAuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| OAuthError::invalid_request(format!("malformed JSON body: {}", e)))?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| OAuthError::invalid_request(format!("malformed form body: {}", e)))?;
            Ok(Self(body))
        }
    }
}
