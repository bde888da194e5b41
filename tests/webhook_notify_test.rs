mod common;

use chrono::Utc;
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use common::*;
use pesaflow_core::domain::{AccountStatus, NewCharge, Rail, SettlementOutcome, Transaction};
use pesaflow_core::services::webhook::{ChargeEvent, WebhookNotifier, SIGNATURE_HEADER};

fn settled_transaction() -> Transaction {
    let tx = Transaction::new(NewCharge {
        account_id: Uuid::new_v4(),
        amount: 10_000,
        currency: "KES".to_string(),
        phone: "254712345678".to_string(),
        rail: Rail::Mpesa,
        fee_amount: 2_250,
        fee_rate_bps: 250,
        description: Some("Order 42".to_string()),
        external_ref: Some("order-42".to_string()),
        metadata: json!({ "mode": "sandbox" }),
    });

    tx.resolved(
        &SettlementOutcome::Succeeded {
            provider_ref: "SANDBOX_1700000000000".to_string(),
            simulated: true,
        },
        Utc::now(),
    )
}

#[tokio::test]
async fn delivers_a_signed_event() {
    let mut server = mockito::Server::new_async().await;
    let tx = settled_transaction();

    let body = serde_json::to_vec(&ChargeEvent::from_transaction(&tx)).unwrap();
    let signature = WebhookNotifier::signature("whsec_test", &body);

    let hook = server
        .mock("POST", "/hooks")
        .match_header(SIGNATURE_HEADER, signature.as_str())
        .match_body(Matcher::Exact(String::from_utf8(body).unwrap()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let notifier = WebhookNotifier::new(Duration::from_secs(2), 1).unwrap();
    notifier
        .notify(&format!("{}/hooks", server.url()), "whsec_test", &tx)
        .await;

    hook.assert_async().await;
}

#[tokio::test]
async fn retries_once_on_server_error_then_gives_up() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hooks")
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let notifier = WebhookNotifier::new(Duration::from_secs(2), 1).unwrap();
    notifier
        .notify(
            &format!("{}/hooks", server.url()),
            "whsec_test",
            &settled_transaction(),
        )
        .await;

    hook.assert_async().await;
}

#[tokio::test]
async fn does_not_retry_client_rejections() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hooks")
        .with_status(410)
        .expect(1)
        .create_async()
        .await;

    let notifier = WebhookNotifier::new(Duration::from_secs(2), 3).unwrap();
    notifier
        .notify(
            &format!("{}/hooks", server.url()),
            "whsec_test",
            &settled_transaction(),
        )
        .await;

    hook.assert_async().await;
}

#[tokio::test]
async fn invalid_endpoint_is_skipped() {
    let notifier = WebhookNotifier::new(Duration::from_secs(2), 1).unwrap();
    // Nothing to assert beyond not hanging or panicking.
    notifier
        .notify("not a url", "whsec_test", &settled_transaction())
        .await;
}

#[tokio::test]
async fn sandbox_settlement_delivers_the_configured_webhook() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hooks/pesaflow")
        .match_header(SIGNATURE_HEADER, Matcher::Regex("^[0-9a-f]{64}$".to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let harness = harness(test_config(100)).await;
    let url = format!("{}/hooks/pesaflow", server.url());
    seed_account(
        &harness.accounts,
        AccountStatus::EmailVerified,
        Some("sk_test_hooked"),
        None,
        Some((&url, "whsec_live_event")),
    )
    .await;

    let (status, body) = post_charge(
        &harness,
        Some("sk_test_hooked"),
        json!({ "amount": 10000, "phone": "0712345678" }),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["status"], "PENDING");

    // Give the deferred settlement task time to resolve and deliver.
    tokio::time::sleep(Duration::from_millis(500)).await;

    hook.assert_async().await;
}
