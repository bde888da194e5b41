use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pesaflow_core::adapters::{PostgresAccountStore, PostgresLedger};
use pesaflow_core::config::Config;
use pesaflow_core::ports::{AccountStore, TransactionLedger};
use pesaflow_core::services::run_sweeper;
use pesaflow_core::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = db::create_pool(&config).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let ledger: Arc<dyn TransactionLedger> = Arc::new(PostgresLedger::new(pool.clone()));
    let accounts: Arc<dyn AccountStore> = Arc::new(PostgresAccountStore::new(pool));

    let state = AppState::new(config.clone(), Arc::clone(&ledger), Arc::clone(&accounts))?;

    // Background sweep for transactions stuck in PENDING.
    tokio::spawn(run_sweeper(
        ledger,
        accounts,
        Arc::clone(&state.notifier),
        config.sweep,
    ));

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
