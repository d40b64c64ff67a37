mod auth_code;
mod client;
mod token;

pub use auth_code::{AuthorizationCode, AuthorizationCodeRow, CodeChallengeMethod};
pub use client::{Client, ClientRow, GrantType};
pub use token::{Token, TokenRow};
