//! Delivers terminal-state events to merchant-configured endpoints. Delivery
//! is best-effort: failures are logged and never touch transaction state.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use url::Url;

use crate::domain::{Transaction, TransactionStatus};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-pesaflow-signature";

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Terminal-state event pushed to the merchant.
#[derive(Debug, Serialize)]
pub struct ChargeEvent<'a> {
    pub event: &'static str,
    pub transaction_id: &'a str,
    pub status: TransactionStatus,
    pub amount: i64,
    pub fee: i64,
    pub currency: &'a str,
    pub rail: &'a str,
    pub provider_ref: Option<&'a str>,
    pub external_ref: Option<&'a str>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl<'a> ChargeEvent<'a> {
    pub fn from_transaction(tx: &'a Transaction) -> Self {
        let event = match tx.status {
            TransactionStatus::Success => "charge.succeeded",
            _ => "charge.failed",
        };

        Self {
            event,
            transaction_id: &tx.id,
            status: tx.status,
            amount: tx.amount,
            fee: tx.fee_amount,
            currency: &tx.currency,
            rail: tx.rail.as_str(),
            provider_ref: tx.provider_ref.as_deref(),
            external_ref: tx.external_ref.as_deref(),
            completed_at: tx.completed_at,
        }
    }
}

#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    max_retries: usize,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration, max_retries: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_retries,
        })
    }

    /// HMAC-SHA256 hex digest over the raw body, sent in the signature
    /// header so the merchant can verify origin.
    pub fn signature(secret: &str, body: &[u8]) -> String {
        // HMAC accepts keys of any length, so new_from_slice cannot fail here.
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("hmac-sha256 accepts any key length");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// POST the event for `tx` to the merchant endpoint. Retries on 5xx and
    /// connect errors with a short backoff.
    pub async fn notify(&self, endpoint_url: &str, secret: &str, tx: &Transaction) {
        if Url::parse(endpoint_url).is_err() {
            tracing::warn!(
                transaction_id = %tx.id,
                url = %endpoint_url,
                "skipping webhook: endpoint is not a valid URL"
            );
            return;
        }

        let event = ChargeEvent::from_transaction(tx);
        let body = match serde_json::to_vec(&event) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(transaction_id = %tx.id, error = %err, "webhook serialization failed");
                return;
            }
        };
        let signature = Self::signature(secret, &body);

        let mut attempts = 0usize;
        loop {
            attempts += 1;
            let result = self
                .client
                .post(endpoint_url)
                .header("content-type", "application/json")
                .header(SIGNATURE_HEADER, signature.clone())
                .body(body.clone())
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(
                        transaction_id = %tx.id,
                        event = event.event,
                        attempts,
                        "webhook delivered"
                    );
                    return;
                }
                Ok(response) => {
                    let status = response.status();
                    if status.is_server_error() && attempts <= self.max_retries {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                        continue;
                    }
                    tracing::warn!(
                        transaction_id = %tx.id,
                        %status,
                        attempts,
                        "webhook delivery rejected"
                    );
                    return;
                }
                Err(err) => {
                    if attempts <= self.max_retries {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                        continue;
                    }
                    tracing::warn!(
                        transaction_id = %tx.id,
                        error = %err,
                        attempts,
                        "webhook delivery failed"
                    );
                    return;
                }
            }
        }
    }

    /// Notify if the account has delivery configured; no-op otherwise.
    pub async fn notify_endpoint(&self, endpoint: Option<(String, String)>, tx: &Transaction) {
        if let Some((url, secret)) = endpoint {
            self.notify(&url, &secret, tx).await;
        }
    }
}
