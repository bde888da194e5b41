//! Pure domain types and functions. Nothing in this module performs I/O.

pub mod account;
pub mod fees;
pub mod kyc;
pub mod phone;
pub mod transaction;

pub use account::{Account, AccountStatus, ApiMode};
pub use fees::FeeSchedule;
pub use kyc::{KycRecord, KycStatus};
pub use phone::{PhoneError, Rail};
pub use transaction::{NewCharge, SettlementOutcome, Transaction, TransactionStatus};
