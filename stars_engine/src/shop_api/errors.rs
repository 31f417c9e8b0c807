use thiserror::Error;

use crate::{
    db_types::{ProductId, Stars},
    helpers::ValidationError,
    traits::{CatalogError, LedgerError},
};

#[derive(Debug, Clone, Error)]
pub enum PurchaseFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} is no longer available")]
    ProductNotFound(ProductId),
    #[error("Insufficient funds. The balance is {balance}, but {required} is required")]
    InsufficientFunds { balance: Stars, required: Stars },
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl From<LedgerError> for PurchaseFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds { balance, required } => Self::InsufficientFunds { balance, required },
            LedgerError::InvalidAmount(amount) => Self::Validation(ValidationError::NotPositive(amount.value())),
            LedgerError::Overflow(amount) => Self::Validation(ValidationError::TooLarge(amount)),
            LedgerError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<CatalogError> for PurchaseFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => Self::ProductNotFound(id),
            other => Self::DatabaseError(other.to_string()),
        }
    }
}
