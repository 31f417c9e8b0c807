//! Parsing of the free-text numbers users and administrators type in.
//!
//! Text is rejected here, before it can reach the ledger or the catalog, so that a flow can re-prompt at the same step.
use thiserror::Error;

use crate::db_types::{Stars, UserId};

/// The smallest deposit the shop will issue an invoice for.
pub const MIN_DEPOSIT: Stars = Stars::from_const(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
    #[error("The amount must be greater than zero. Got {0}")]
    NotPositive(i64),
    #[error("The amount must be at least {minimum}. Got {value}")]
    BelowMinimum { value: Stars, minimum: Stars },
    #[error("Missing value: {0}")]
    MissingValue(&'static str),
    #[error("The amount {0} would take the balance past its limit")]
    TooLarge(Stars),
}

/// Parses a strictly positive, integer star amount. Surrounding whitespace is ignored.
pub fn parse_positive_amount(text: &str) -> Result<Stars, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::MissingValue("amount"));
    }
    let value = text.parse::<i64>().map_err(|_| ValidationError::NotANumber(text.to_string()))?;
    if value <= 0 {
        return Err(ValidationError::NotPositive(value));
    }
    Ok(Stars::from(value))
}

/// Parses the `<user id> <amount>` argument pair of the grant and revoke commands.
pub fn parse_user_and_amount(args: &str) -> Result<(UserId, Stars), ValidationError> {
    let mut parts = args.split_whitespace();
    let user = parts.next().ok_or(ValidationError::MissingValue("user id"))?;
    let user = user.parse::<UserId>().map_err(|_| ValidationError::NotANumber(user.to_string()))?;
    let amount = parts.next().ok_or(ValidationError::MissingValue("amount"))?;
    let amount = parse_positive_amount(amount)?;
    Ok((user, amount))
}
