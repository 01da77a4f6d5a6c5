//! Codenames game server.
//!
//! Serves the REST API and the per-game WebSocket stream. Game sessions
//! live in memory; the word pool is kept in PostgreSQL when a database URL
//! is configured.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use cn_server::{api, config::ServerConfig, logging, metrics};
use codenames::{
    HubActor,
    db::Database,
    words::{InMemoryWordRepository, PgWordRepository, WordRepository},
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the codenames game server

USAGE:
  cn_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Word pool database          [default: env DATABASE_URL, in-memory when unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string for the word pool
  DB_MAX_CONNECTIONS       Pool size                   [default: 10]
  HUB_QUEUE_CAPACITY       Per-connection outbound queue [default: 256]
  HUB_CONTROL_CAPACITY     Hub control queue           [default: 256]
  WS_PONG_WAIT_SECS        Heartbeat window            [default: 60]
  WS_WRITE_WAIT_SECS       Single write deadline       [default: 10]
  METRICS_BIND             Prometheus listener address [default: disabled]
  RUST_LOG                 Log filter                  [default: info,sqlx=warn,hyper=warn]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .context("Invalid --bind address")?;
    let database_url: Option<String> = pargs
        .opt_value_from_str("--db-url")
        .context("Invalid --db-url")?;

    let config = ServerConfig::from_env(bind, database_url)?;
    config.validate()?;

    logging::init();
    info!("Starting codenames server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics listening on {}", addr);
    }

    let (words, database): (Arc<dyn WordRepository>, Option<Database>) = match &config.database {
        Some(db_config) => {
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            let repo = PgWordRepository::new(db.pool().clone());
            repo.init().await.context("Failed to initialize word table")?;
            info!("Word pool stored in PostgreSQL");
            (Arc::new(repo), Some(db))
        }
        None => {
            info!("No DATABASE_URL set, using the in-memory word pool");
            (Arc::new(InMemoryWordRepository::new()), None)
        }
    };

    let hub = HubActor::spawn(config.hub.clone());
    let state = api::AppState::new(hub.clone(), words, database.clone());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    hub.shutdown().await;
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
