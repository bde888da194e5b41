use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

use crate::domain::FeeSchedule;
use crate::services::{SimulatorSettings, SweepSettings};

/// Process-wide configuration, read once at startup. Every engine constant
/// lives here so tests and deployments can override it; nothing is hardcoded
/// at the point of use.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    /// Charge floor in minor units.
    pub min_charge_amount: i64,
    pub default_currency: String,
    pub fees: FeeSchedule,
    pub simulator: SimulatorSettings,
    pub sweep: SweepSettings,
    pub webhook_timeout_secs: u64,
    pub webhook_max_retries: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            min_charge_amount: parsed_or("MIN_CHARGE_AMOUNT", 100),
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "KES".to_string()),
            fees: FeeSchedule {
                rate_bps: parsed_or("FEE_RATE_BPS", FeeSchedule::default().rate_bps),
                fixed: parsed_or("FEE_FIXED", FeeSchedule::default().fixed),
            },
            simulator: SimulatorSettings {
                delay_ms: parsed_or("SANDBOX_DELAY_MS", SimulatorSettings::default().delay_ms),
                success_rate_pct: parsed_or(
                    "SANDBOX_SUCCESS_RATE_PCT",
                    SimulatorSettings::default().success_rate_pct,
                ),
            },
            sweep: SweepSettings {
                interval_secs: parsed_or(
                    "RECONCILE_INTERVAL_SECS",
                    SweepSettings::default().interval_secs,
                ),
                stale_after_secs: parsed_or(
                    "RECONCILE_STALE_AFTER_SECS",
                    SweepSettings::default().stale_after_secs,
                ),
            },
            webhook_timeout_secs: parsed_or("WEBHOOK_TIMEOUT_SECS", 10),
            webhook_max_retries: parsed_or("WEBHOOK_MAX_RETRIES", 3),
        })
    }

    /// Config for tests and local tools that never touch the database URL.
    pub fn for_tests() -> Self {
        Config {
            server_port: 0,
            database_url: String::new(),
            min_charge_amount: 100,
            default_currency: "KES".to_string(),
            fees: FeeSchedule::default(),
            simulator: SimulatorSettings::default(),
            sweep: SweepSettings::default(),
            webhook_timeout_secs: 2,
            webhook_max_retries: 1,
        }
    }
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
