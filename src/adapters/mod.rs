pub mod memory;
pub mod postgres;

pub use memory::{InMemoryAccounts, InMemoryLedger};
pub use postgres::{PostgresAccountStore, PostgresLedger};
