//! Platform fee schedule. All arithmetic is over integer minor-currency
//! units; the percentage component is expressed in basis points so no
//! floating point is involved anywhere.

use serde::Deserialize;

/// Percentage-plus-fixed fee schedule, captured once per transaction.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeeSchedule {
    /// Percentage component in basis points (250 = 2.5%).
    pub rate_bps: u32,
    /// Fixed component in minor units.
    pub fixed: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        // 2.5% + KSh 20.
        Self {
            rate_bps: 250,
            fixed: 2000,
        }
    }
}

impl FeeSchedule {
    /// `fee(amount) = round_half_up(amount * rate) + fixed`.
    pub fn fee(&self, amount: i64) -> i64 {
        let scaled = amount * i64::from(self.rate_bps);
        (scaled + 5_000) / 10_000 + self.fixed
    }

    /// What the merchant receives after the platform fee.
    pub fn net(&self, amount: i64) -> i64 {
        amount - self.fee(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_matches_published_pricing() {
        let fees = FeeSchedule::default();
        // KSh 100.00 at 2.5% + KSh 20 fixed.
        assert_eq!(fees.fee(10_000), 2_250);
        assert_eq!(fees.net(10_000), 7_750);
    }

    #[test]
    fn rounds_half_up_at_the_boundary() {
        let fees = FeeSchedule::default();
        // 20 * 0.025 = 0.5, which rounds up.
        assert_eq!(fees.fee(20), 2_001);
        // 19 * 0.025 = 0.475, which rounds down.
        assert_eq!(fees.fee(19), 2_000);
    }

    #[test]
    fn fee_is_deterministic() {
        let fees = FeeSchedule {
            rate_bps: 300,
            fixed: 500,
        };
        assert_eq!(fees.fee(123_456), fees.fee(123_456));
    }

    #[test]
    fn fee_is_never_negative_for_valid_amounts() {
        let fees = FeeSchedule::default();
        for amount in [0, 1, 99, 100, 1_000_000] {
            assert!(fees.fee(amount) >= 0);
        }
    }
}
