pub mod authenticator;
pub mod reconciliation;
pub mod settlement;
pub mod webhook;

pub use authenticator::{credential_from_headers, AuthContext, Authenticator};
pub use reconciliation::{run_sweeper, SweepSettings};
pub use settlement::{
    LiveSettlementNetwork, SettlementRouter, SimulatorSettings, UnimplementedNetwork,
};
pub use webhook::WebhookNotifier;
