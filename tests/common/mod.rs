#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use pesaflow_core::adapters::{InMemoryAccounts, InMemoryLedger};
use pesaflow_core::config::Config;
use pesaflow_core::domain::{Account, AccountStatus};
use pesaflow_core::services::Authenticator;
use pesaflow_core::AppState;

pub const SANDBOX_KEY: &str = "sk_test_mamamboga";
pub const SANDBOX_KEY_OTHER: &str = "sk_test_otherduka";
pub const SANDBOX_KEY_SUSPENDED: &str = "sk_test_suspended";
pub const LIVE_KEY_APPROVED: &str = "sk_live_approved";
pub const LIVE_KEY_PENDING: &str = "sk_live_pending";

pub struct TestHarness {
    pub state: AppState,
    pub ledger: Arc<InMemoryLedger>,
    pub accounts: Arc<InMemoryAccounts>,
}

impl TestHarness {
    pub fn app(&self) -> axum::Router {
        pesaflow_core::create_app(self.state.clone())
    }
}

/// Fast simulator so tests can observe terminal states without real waits.
pub fn test_config(success_rate_pct: u8) -> Config {
    let mut config = Config::for_tests();
    config.simulator.delay_ms = 50;
    config.simulator.success_rate_pct = success_rate_pct;
    config
}

pub async fn seed_account(
    accounts: &InMemoryAccounts,
    status: AccountStatus,
    sandbox_key: Option<&str>,
    live_key: Option<&str>,
    webhook: Option<(&str, &str)>,
) -> Uuid {
    let id = Uuid::new_v4();
    let account = Account {
        id,
        business_name: format!("Biashara {}", id.simple()),
        email: format!("{}@example.ke", id.simple()),
        status,
        webhook_url: webhook.map(|(url, _)| url.to_string()),
        webhook_secret: webhook.map(|(_, secret)| secret.to_string()),
        created_at: Utc::now(),
    };

    accounts
        .add(
            account,
            sandbox_key.map(str::to_string),
            live_key.map(Authenticator::fingerprint),
        )
        .await;
    id
}

/// Harness with the standard cast of merchant accounts.
pub async fn harness(config: Config) -> TestHarness {
    let ledger = Arc::new(InMemoryLedger::new());
    let accounts = Arc::new(InMemoryAccounts::new());

    seed_account(
        &accounts,
        AccountStatus::EmailVerified,
        Some(SANDBOX_KEY),
        None,
        None,
    )
    .await;
    seed_account(
        &accounts,
        AccountStatus::Approved,
        Some(SANDBOX_KEY_OTHER),
        None,
        None,
    )
    .await;
    seed_account(
        &accounts,
        AccountStatus::Suspended,
        Some(SANDBOX_KEY_SUSPENDED),
        None,
        None,
    )
    .await;
    seed_account(
        &accounts,
        AccountStatus::Approved,
        None,
        Some(LIVE_KEY_APPROVED),
        None,
    )
    .await;
    seed_account(
        &accounts,
        AccountStatus::Pending,
        None,
        Some(LIVE_KEY_PENDING),
        None,
    )
    .await;

    let state = AppState::new(
        config,
        ledger.clone() as Arc<dyn pesaflow_core::ports::TransactionLedger>,
        accounts.clone() as Arc<dyn pesaflow_core::ports::AccountStore>,
    )
    .expect("app state");

    TestHarness {
        state,
        ledger,
        accounts,
    }
}

/// Drive the router directly; returns status plus parsed JSON body.
pub async fn send_json(
    app: axum::Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

pub async fn post_charge(
    harness: &TestHarness,
    api_key: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(harness.app(), "POST", "/charge", api_key, Some(body)).await
}
