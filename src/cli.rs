//! Administrative subcommands.
//!
//! Thin wrappers over the lifecycle services: `setup` provisions the schema
//! and the personal-access client, `client` registers clients, `purge`
//! prunes dead credentials. Secrets are printed exactly once and never
//! logged.

use sqlx::MySqlPool;

use crate::config::Config;
use crate::models::GrantType;
use crate::repositories::schema::ensure_schema;
use crate::services::{AuthCodeService, ClientService, NewClient, TokenService};

/// `setup`: create the tables and a default first-party client for
/// personal access tokens.
pub async fn setup(pool: &MySqlPool) -> anyhow::Result<()> {
    ensure_schema(pool).await?;

    let (client, _) = ClientService::new(pool.clone())
        .create(NewClient {
            name: "Personal Access Client".to_string(),
            redirect_uris: Vec::new(),
            scopes: None,
            grant_types: Some(Vec::new()),
            confidential: true,
            first_party: true,
        })
        .await?;

    println!("Schema is in place.");
    println!("Personal access client id: {}", client.id);
    println!("Set OAUTH_PERSONAL_ACCESS_CLIENT={} to enable personal tokens.", client.id);
    Ok(())
}

/// Arguments of the `client` subcommand.
pub struct ClientArgs {
    pub name: String,
    pub redirect_uris: Vec<String>,
    pub public: bool,
    pub first_party: bool,
    pub credentials: bool,
}

/// `client`: register a client and print its id and one-time secret.
pub async fn create_client(pool: &MySqlPool, args: ClientArgs) -> anyhow::Result<()> {
    let grant_types = if args.credentials {
        vec![GrantType::ClientCredentials]
    } else {
        vec![GrantType::AuthorizationCode, GrantType::RefreshToken]
    };

    let (client, secret) = ClientService::new(pool.clone())
        .create(NewClient {
            name: args.name,
            redirect_uris: args.redirect_uris,
            scopes: None,
            grant_types: Some(grant_types),
            confidential: !args.public,
            first_party: args.first_party,
        })
        .await?;

    println!("Client id: {}", client.id);
    match secret {
        Some(secret) => println!("Client secret (shown once): {}", secret),
        None => println!("Public client; no secret issued."),
    }
    Ok(())
}

/// `purge`: drop used/expired authorization codes and dead tokens.
pub async fn purge(pool: &MySqlPool, config: &Config, days: Option<i64>) -> anyhow::Result<()> {
    let config = std::sync::Arc::new(config.clone());
    let retention_days = days.unwrap_or(config.prune_revoked_after_days);

    let tokens = TokenService::new(pool.clone(), config.clone())
        .prune(retention_days)
        .await?;
    let codes = AuthCodeService::new(pool.clone(), config)
        .prune()
        .await?;

    println!("Pruned {} tokens and {} authorization codes.", tokens, codes);
    Ok(())
}
