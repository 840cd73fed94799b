//! Metergate HTTP server binary.
//!
//! Reads configuration from flags or the environment (a `.env` file is
//! honoured), migrates every configured data source and serves the gateway
//! until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use metergate_api::config::{ApiConfig, ConfigError};
use metergate_core::store::PgStore;
use tracing::info;

/// CLI arguments for the gateway server.
#[derive(Parser, Debug)]
#[command(name = "metergate_server", about = "Metergate meter status gateway")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    bind_addr: String,

    /// Primary source (`PKG1`, user accounts).
    #[arg(long, env = "DB_URL1", hide_env_values = true)]
    db_url1: String,

    /// Secondary source (`PKG3`). Without it every package resolves to the primary.
    #[arg(long, env = "DB_URL3", hide_env_values = true)]
    db_url3: Option<String>,

    /// HS256 signing secret.
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value_t = 60)]
    access_token_expire_minutes: i64,

    #[arg(long, env = "REFRESH_TOKEN_EXPIRE_DAYS", default_value_t = 7)]
    refresh_token_expire_days: i64,

    /// Upper bound on each database call, in seconds.
    #[arg(long, env = "QUERY_TIMEOUT_SECS", default_value_t = 5)]
    query_timeout_secs: u64,

    /// Maximum number of connections per data source pool.
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,
}

impl Args {
    fn into_config(self) -> Result<ApiConfig, ConfigError> {
        let mut config = ApiConfig::new(self.db_url1, self.secret_key);
        config.bind_addr = self.bind_addr;
        config.secondary_db_url = self.db_url3;
        config.access_token_ttl = chrono::Duration::try_minutes(self.access_token_expire_minutes)
            .ok_or(ConfigError::OutOfRange("access token TTL"))?;
        config.refresh_token_ttl = chrono::Duration::try_days(self.refresh_token_expire_days)
            .ok_or(ConfigError::OutOfRange("refresh token TTL"))?;
        config.query_timeout = Duration::from_secs(self.query_timeout_secs);
        config.max_connections = self.max_connections;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,metergate_api=debug,metergate_core=debug",
                )
            }),
        )
        .init();

    let config = Args::parse().into_config()?;

    info!(
        bind_addr = %config.bind_addr,
        sources = config.data_source_urls().len(),
        max_connections = config.max_connections,
        "starting metergate_server"
    );

    let store = Arc::new(PgStore::connect(&config.data_source_urls(), &config.store_options()).await?);

    info!("running database migrations");
    store.migrate().await?;

    let state = metergate_api::AppState::new(&config, store.clone());
    let cleanup = state.tokens.registry().spawn_cleanup_task();

    let app = metergate_api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    cleanup.abort();
    store.close().await;
    info!("stopped");
    Ok(())
}
