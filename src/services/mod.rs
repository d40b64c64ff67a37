mod auth_code;
mod client;
mod oauth;
mod token;

pub use auth_code::{AuthCodeService, NewAuthCode};
pub use client::{ClientService, NewClient};
pub use oauth::{
    append_query, error_redirect, AuthorizePrompt, AuthorizeRequest, ConsentDecision,
    IntrospectionResponse, OAuthService, TokenIntentRequest, TokenRequest, TokenResponse,
};
pub use token::{IssuedToken, NewToken, TokenService};
