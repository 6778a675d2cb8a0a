//! Console front end for the ordering workflow.
//!
//! Reads `<userId> <text>` lines from stdin and prints what a chat transport
//! would show. Runs against Redis and `PostgreSQL` unless `COURIER_IN_MEMORY=1`.

use anyhow::Context;
use courier_bot::config::Config;
use courier_bot::console;
use courier_bot::providers::{OrderRepository, SessionStore};
use courier_bot::stores::{PostgresOrderRepository, RedisSessionStore};
use courier_bot::{Orchestrator, PersistenceGateway};
use courier_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,courier_bot=debug,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(config.log_level.as_deref().unwrap_or(DEFAULT_FILTER)))
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if config.in_memory {
        return run_in_memory(&config, clock).await;
    }

    info!(redis_url = %config.redis_url, "Connecting to session store");
    let sessions = RedisSessionStore::new(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;

    info!("Connecting to order database");
    let repository = PostgresOrderRepository::connect(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    repository.initialize().await.context("Failed to initialize schema")?;

    let orchestrator = Orchestrator::new(
        sessions,
        PersistenceGateway::new(repository, config.retry_policy()),
        clock,
        config.workflow_config(),
    );
    run(&orchestrator).await
}

#[cfg(feature = "test-utils")]
async fn run_in_memory(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<()> {
    use courier_bot::mocks::{InMemoryOrderRepository, InMemorySessionStore};

    info!("Running on in-memory stores");
    let orchestrator = Orchestrator::new(
        InMemorySessionStore::new(Arc::clone(&clock)),
        PersistenceGateway::new(InMemoryOrderRepository::with_default_catalog(), config.retry_policy()),
        clock,
        config.workflow_config(),
    );
    run(&orchestrator).await
}

#[cfg(not(feature = "test-utils"))]
async fn run_in_memory(_config: &Config, _clock: Arc<dyn Clock>) -> anyhow::Result<()> {
    anyhow::bail!("COURIER_IN_MEMORY requires the `test-utils` feature")
}

async fn run<S: SessionStore, R: OrderRepository>(orchestrator: &Orchestrator<S, R>) -> anyhow::Result<()> {
    info!("Ready: type `<userId> <text>`, `#contact`, `#photo` or `#button` lines");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(inbound) = console::parse_line(&line) else {
            if !line.trim().is_empty() {
                eprintln!("usage: <userId> <text> | <userId> #contact|#photo|#button <value>");
            }
            continue;
        };

        let user_id = inbound.user_id;
        for effect in orchestrator.handle(inbound).await {
            if let Some(text) = console::render(&effect) {
                println!("[{user_id}] {text}\n");
            }
        }
    }
    Ok(())
}
