use serde::Serialize;

use crate::db_types::{Deposit, Product, Purchase, Stars};

/// Published after a purchase has been committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseCompletedEvent {
    pub purchase: Purchase,
    pub product: Product,
    pub new_balance: Stars,
    /// The buyer's chat username, if they have one.
    pub username: Option<String>,
}

impl PurchaseCompletedEvent {
    pub fn new(purchase: Purchase, product: Product, new_balance: Stars, username: Option<String>) -> Self {
        Self { purchase, product, new_balance, username }
    }
}

/// Published after a confirmed deposit has been credited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositReceivedEvent {
    pub deposit: Deposit,
    pub new_balance: Stars,
    pub username: Option<String>,
}

impl DepositReceivedEvent {
    pub fn new(deposit: Deposit, new_balance: Stars, username: Option<String>) -> Self {
        Self { deposit, new_balance, username }
    }
}
