//! Phone normalization and payment-rail classification.
//! Pure functions so they are usable from validation contexts without a handle
//! to any service state.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kenyan country code. Canonical numbers always start with it.
pub const COUNTRY_CODE: &str = "254";

/// A canonical number shorter than this is not a dialable subscriber number.
pub const MIN_CANONICAL_DIGITS: usize = 12;

// Ordered prefix groups over canonical (254...) numbers. Safaricom is checked
// before Airtel; first match wins.
const MPESA_PREFIXES: &[&str] = &["2547", "2541"];
const AIRTEL_PREFIXES: &[&str] = &["2548", "2550"];

/// The mobile-money network a charge is collected through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rail {
    Mpesa,
    Airtel,
    /// Reserved. No card acquirer is connected.
    Card,
}

impl Rail {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rail::Mpesa => "MPESA",
            Rail::Airtel => "AIRTEL",
            Rail::Card => "CARD",
        }
    }
}

impl fmt::Display for Rail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MPESA" => Ok(Rail::Mpesa),
            "AIRTEL" => Ok(Rail::Airtel),
            "CARD" => Ok(Rail::Card),
            other => Err(format!("unknown rail: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("Invalid phone number format")]
    TooShort,
    #[error("Unsupported phone number. Use Safaricom or Airtel numbers.")]
    UnsupportedRail,
}

/// Reduce arbitrary caller formatting to a digits-only international number:
/// strip non-digits, replace a local leading `0` with the country code, and
/// prepend the country code when it is missing.
pub fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if let Some(rest) = digits.strip_prefix('0') {
        return format!("{}{}", COUNTRY_CODE, rest);
    }

    if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    }
}

/// Classify a canonical number into its rail. Numbers matching neither
/// explicit prefix group but still plausibly domestic (country code or local
/// leading zero) fall back to M-Pesa, the majority rail.
pub fn classify(canonical: &str) -> Option<Rail> {
    if MPESA_PREFIXES.iter().any(|p| canonical.starts_with(p)) {
        return Some(Rail::Mpesa);
    }

    if AIRTEL_PREFIXES.iter().any(|p| canonical.starts_with(p)) {
        return Some(Rail::Airtel);
    }

    if canonical.starts_with(COUNTRY_CODE) || canonical.starts_with('0') {
        return Some(Rail::Mpesa);
    }

    None
}

/// Normalize and classify in one step, enforcing the minimum canonical length.
pub fn canonicalize(raw: &str) -> Result<(String, Rail), PhoneError> {
    let canonical = normalize(raw);

    if canonical.len() < MIN_CANONICAL_DIGITS {
        return Err(PhoneError::TooShort);
    }

    let rail = classify(&canonical).ok_or(PhoneError::UnsupportedRail)?;
    Ok((canonical, rail))
}
