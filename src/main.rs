use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::mysql::MySqlPoolOptions;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oauth2_server::cli;
use oauth2_server::config::{AppState, Config};
use oauth2_server::handlers;
use oauth2_server::repositories::schema::ensure_schema;
use oauth2_server::users::StaticUserDirectory;

#[derive(Parser)]
#[command(
    name = "oauth2-server",
    about = "OAuth 2.0 authorization server",
    long_about = "Issues, refreshes, revokes, and introspects opaque OAuth 2.0 credentials \
                  (RFC 6749, 7636, 7009, 7662)."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create the tables and a default personal-access client
    Setup,

    /// Register an OAuth client and print its credentials
    Client {
        /// Display name
        #[arg(long)]
        name: String,

        /// Registered redirect URI (repeatable)
        #[arg(long = "redirect")]
        redirect_uris: Vec<String>,

        /// Register without a secret (PKCE required)
        #[arg(long)]
        public: bool,

        /// Skip the consent screen for this client
        #[arg(long)]
        first_party: bool,

        /// Register for the client_credentials grant
        #[arg(long)]
        credentials: bool,
    },

    /// Prune expired codes and dead tokens
    Purge {
        /// Retention window for revoked tokens, in days
        #[arg(long)]
        days: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oauth2_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        Command::Setup => cli::setup(&pool).await,
        Command::Client {
            name,
            redirect_uris,
            public,
            first_party,
            credentials,
        } => {
            cli::create_client(
                &pool,
                cli::ClientArgs {
                    name,
                    redirect_uris,
                    public,
                    first_party,
                    credentials,
                },
            )
            .await
        }
        Command::Purge { days } => cli::purge(&pool, &config, days).await,
    }
}

async fn serve(pool: sqlx::MySqlPool, config: Config) -> anyhow::Result<()> {
    ensure_schema(&pool).await?;

    let addr = config.socket_addr()?;
    // The standalone binary has no user subsystem; hosts embed the router
    // with their own directory.
    let state = AppState::new(pool, config, Arc::new(StaticUserDirectory::new()));

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    tracing::info!(
        "OAuth2 server v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
