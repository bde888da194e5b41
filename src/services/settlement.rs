//! Settlement strategies. A PENDING transaction is resolved exactly once,
//! out-of-band from the request that created it: the sandbox simulator on a
//! deferred timer task, or the live network adapter through its provider
//! callback. Both funnel through the ledger's conditional update, so a
//! duplicate or racing resolution is always a no-op.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::domain::{Account, ApiMode, SettlementOutcome, Transaction};
use crate::error::AppError;
use crate::ports::{Resolution, TransactionLedger};
use crate::services::webhook::WebhookNotifier;

/// Knobs for the sandbox simulator, injected from config.
#[derive(Debug, Clone, Copy)]
pub struct SimulatorSettings {
    pub delay_ms: u64,
    /// Probability of SUCCESS, in percent (0..=100).
    pub success_rate_pct: u8,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        // ~3 seconds, 4-in-5 success, like the hosted sandbox.
        Self {
            delay_ms: 3_000,
            success_rate_pct: 80,
        }
    }
}

/// The real mobile-money network. Implementations receive the transaction,
/// initiate collection, and later resolve it exactly once via the ledger's
/// conditional update when the provider callback lands.
#[async_trait]
pub trait LiveSettlementNetwork: Send + Sync {
    async fn initiate(&self, tx: &Transaction) -> Result<(), AppError>;
}

/// Placeholder until a provider integration lands. Accepts the hand-off and
/// performs no call; the reconciliation sweeper bounds how long the
/// transaction can stay PENDING.
pub struct UnimplementedNetwork;

#[async_trait]
impl LiveSettlementNetwork for UnimplementedNetwork {
    async fn initiate(&self, tx: &Transaction) -> Result<(), AppError> {
        tracing::warn!(
            transaction_id = %tx.id,
            rail = %tx.rail,
            "live settlement network not wired; transaction stays PENDING until swept"
        );
        Ok(())
    }
}

/// Dispatches a freshly created transaction to the strategy for its mode.
#[derive(Clone)]
pub struct SettlementRouter {
    ledger: Arc<dyn TransactionLedger>,
    notifier: Arc<WebhookNotifier>,
    network: Arc<dyn LiveSettlementNetwork>,
    simulator: SimulatorSettings,
}

impl SettlementRouter {
    pub fn new(
        ledger: Arc<dyn TransactionLedger>,
        notifier: Arc<WebhookNotifier>,
        network: Arc<dyn LiveSettlementNetwork>,
        simulator: SimulatorSettings,
    ) -> Self {
        Self {
            ledger,
            notifier,
            network,
            simulator,
        }
    }

    pub async fn dispatch(
        &self,
        mode: ApiMode,
        tx: &Transaction,
        account: &Account,
    ) -> Result<(), AppError> {
        match mode {
            ApiMode::Sandbox => {
                // Detached on purpose; the request path never awaits it.
                let _ = self.schedule_simulation(tx, account);
                Ok(())
            }
            ApiMode::Live => self.network.initiate(tx).await,
        }
    }

    /// Spawn the deferred simulator task. The handle is returned for
    /// cancellation but the task is normally left to run to completion; the
    /// request path never awaits it.
    pub fn schedule_simulation(&self, tx: &Transaction, account: &Account) -> JoinHandle<()> {
        let ledger = Arc::clone(&self.ledger);
        let notifier = Arc::clone(&self.notifier);
        let settings = self.simulator;
        let id = tx.id.clone();
        let endpoint = account.webhook_endpoint();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(settings.delay_ms)).await;

            let success = {
                let mut rng = rand::thread_rng();
                rng.gen_range(0..100) < settings.success_rate_pct
            };

            let outcome = if success {
                SettlementOutcome::Succeeded {
                    provider_ref: format!("SANDBOX_{}", Utc::now().timestamp_millis()),
                    simulated: true,
                }
            } else {
                SettlementOutcome::Failed {
                    reason: "Simulated settlement declined".to_string(),
                    simulated: true,
                }
            };

            match ledger.resolve(&id, &outcome).await {
                Ok(Resolution::Applied(resolved)) => {
                    tracing::info!(
                        transaction_id = %id,
                        status = %resolved.status,
                        "sandbox settlement resolved"
                    );
                    notifier.notify_endpoint(endpoint, &resolved).await;
                }
                Ok(Resolution::AlreadySettled) => {
                    tracing::debug!(transaction_id = %id, "sandbox settlement lost the race");
                }
                Err(err) => {
                    tracing::error!(
                        transaction_id = %id,
                        error = %err,
                        "sandbox settlement could not be recorded"
                    );
                }
            }
        })
    }
}
