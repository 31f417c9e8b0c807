mod amounts;
mod deposit_payload;

pub use amounts::{parse_positive_amount, parse_user_and_amount, ValidationError, MIN_DEPOSIT};
pub use deposit_payload::{DepositPayload, DepositPayloadError};
