//! # Deposit invoice payloads
//!
//! The payment provider hands the invoice payload back, untouched, when the payment is confirmed. It is the only link
//! between a confirmed payment and the user that should be credited, so it carries both:
//!
//! ```text
//!    stars_deposit_{user_id}_{amount}
//! ```
use std::{fmt::Display, str::FromStr};

use regex::Regex;
use thiserror::Error;

use crate::db_types::{Stars, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognised deposit payload: {0}")]
pub struct DepositPayloadError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositPayload {
    pub user: UserId,
    pub amount: Stars,
}

impl DepositPayload {
    pub fn new(user: UserId, amount: Stars) -> Self {
        Self { user, amount }
    }
}

impl Display for DepositPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stars_deposit_{}_{}", self.user.0, self.amount.value())
    }
}

impl FromStr for DepositPayload {
    type Err = DepositPayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"^stars_deposit_(\d+)_(\d+)$").map_err(|e| DepositPayloadError(e.to_string()))?;
        let caps = re.captures(s).ok_or_else(|| DepositPayloadError(s.to_string()))?;
        let user = caps[1].parse::<UserId>().map_err(|_| DepositPayloadError(s.to_string()))?;
        let amount = caps[2].parse::<Stars>().map_err(|_| DepositPayloadError(s.to_string()))?;
        if !amount.is_positive() {
            return Err(DepositPayloadError(s.to_string()));
        }
        Ok(Self { user, amount })
    }
}
