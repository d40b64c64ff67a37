//! An OAuth 2.0 authorization server core.
//!
//! Implements the RFC 6749 authorization_code (with RFC 7636 PKCE),
//! client_credentials, and refresh_token grants, RFC 7009 revocation, and
//! RFC 7662 introspection over opaque, hashed-at-rest credentials backed by
//! MySQL. The host supplies the user directory, session storage, and outer
//! HTTP concerns; this crate supplies the protocol state machine, the
//! credential lifecycle, and the bearer guard for protected resources.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod scopes;
pub mod services;
pub mod session;
pub mod users;
pub mod utils;
