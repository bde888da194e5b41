//! Reconciliation sweep for transactions stuck in PENDING: a crashed
//! simulator task, a live charge whose provider callback never arrived, or a
//! process restart between insert and resolution. Runs on a timer and fails
//! anything past the stale threshold through the standard conditional update,
//! so a late settlement racing the sweep is safe in either direction.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::SettlementOutcome;
use crate::ports::{AccountStore, Resolution, StoreError, TransactionLedger};
use crate::services::webhook::WebhookNotifier;

const SWEEP_BATCH_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct SweepSettings {
    pub interval_secs: u64,
    pub stale_after_secs: i64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            stale_after_secs: 900,
        }
    }
}

/// Background loop. Spawned once at startup; never returns.
pub async fn run_sweeper(
    ledger: Arc<dyn TransactionLedger>,
    accounts: Arc<dyn AccountStore>,
    notifier: Arc<WebhookNotifier>,
    settings: SweepSettings,
) {
    tracing::info!(
        interval_secs = settings.interval_secs,
        stale_after_secs = settings.stale_after_secs,
        "reconciliation sweeper started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(settings.interval_secs));
    loop {
        interval.tick().await;
        match sweep_once(&ledger, &accounts, &notifier, settings).await {
            Ok(0) => {}
            Ok(swept) => tracing::info!(swept, "reconciliation sweep resolved stale transactions"),
            Err(err) => tracing::error!(error = %err, "reconciliation sweep failed"),
        }
    }
}

/// One pass: resolve every PENDING transaction older than the threshold to
/// FAILED. Returns how many this pass actually resolved (races excluded).
pub async fn sweep_once(
    ledger: &Arc<dyn TransactionLedger>,
    accounts: &Arc<dyn AccountStore>,
    notifier: &Arc<WebhookNotifier>,
    settings: SweepSettings,
) -> Result<usize, StoreError> {
    let cutoff = Utc::now() - ChronoDuration::seconds(settings.stale_after_secs);
    let stale = ledger.stale_pending(cutoff, SWEEP_BATCH_LIMIT).await?;

    let mut swept = 0usize;
    for tx in stale {
        let outcome = SettlementOutcome::Failed {
            reason: "settlement timed out".to_string(),
            simulated: false,
        };

        match ledger.resolve(&tx.id, &outcome).await {
            Ok(Resolution::Applied(resolved)) => {
                swept += 1;
                tracing::warn!(
                    transaction_id = %resolved.id,
                    age_secs = (Utc::now() - resolved.created_at).num_seconds(),
                    "stale PENDING transaction failed by reconciliation"
                );

                let endpoint = accounts
                    .find_by_id(resolved.account_id)
                    .await?
                    .and_then(|account| account.webhook_endpoint());
                notifier.notify_endpoint(endpoint, &resolved).await;
            }
            Ok(Resolution::AlreadySettled) => {
                // A real settlement landed between the scan and the update.
            }
            Err(err) => {
                tracing::error!(transaction_id = %tx.id, error = %err, "sweep resolution failed");
            }
        }
    }

    Ok(swept)
}
