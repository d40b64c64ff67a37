mod auth_code;
mod client;
pub mod schema;
mod token;

pub use auth_code::AuthCodeRepository;
pub use client::{build_client, ClientRepository};
pub use token::TokenRepository;
