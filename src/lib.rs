pub mod adapters;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod ports;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::ports::{AccountStore, TransactionLedger};
use crate::services::{
    Authenticator, LiveSettlementNetwork, SettlementRouter, UnimplementedNetwork, WebhookNotifier,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: Arc<dyn TransactionLedger>,
    pub authenticator: Authenticator,
    pub settlement: Arc<SettlementRouter>,
    pub notifier: Arc<WebhookNotifier>,
}

impl AppState {
    /// Wire the engine over a pair of stores, with the live network stubbed.
    pub fn new(
        config: Config,
        ledger: Arc<dyn TransactionLedger>,
        accounts: Arc<dyn AccountStore>,
    ) -> anyhow::Result<Self> {
        Self::with_network(config, ledger, accounts, Arc::new(UnimplementedNetwork))
    }

    pub fn with_network(
        config: Config,
        ledger: Arc<dyn TransactionLedger>,
        accounts: Arc<dyn AccountStore>,
        network: Arc<dyn LiveSettlementNetwork>,
    ) -> anyhow::Result<Self> {
        let notifier = Arc::new(WebhookNotifier::new(
            Duration::from_secs(config.webhook_timeout_secs),
            config.webhook_max_retries,
        )?);

        let settlement = Arc::new(SettlementRouter::new(
            Arc::clone(&ledger),
            Arc::clone(&notifier),
            network,
            config.simulator,
        ));

        Ok(Self {
            config: Arc::new(config),
            authenticator: Authenticator::new(accounts),
            ledger,
            settlement,
            notifier,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    // The CORS layer answers pre-flight OPTIONS before anything else runs,
    // so no credential is required for a pre-flight probe.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/charge",
            post(handlers::charge::create_charge).fallback(handlers::method_not_allowed),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction).fallback(handlers::method_not_allowed),
        )
        .layer(cors)
        .with_state(state)
}
