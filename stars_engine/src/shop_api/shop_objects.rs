use serde::Serialize;

use crate::{
    db_types::{Deposit, Product, Purchase, Stars, UserId},
    helpers::DepositPayload,
};

/// The personal account screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user: UserId,
    pub balance: Stars,
    pub purchase_count: i64,
}

/// What the buyer is asked to confirm before a purchase is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseQuote {
    pub product: Product,
    pub balance: Stars,
    pub balance_after: Stars,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub product: Product,
    pub new_balance: Stars,
}

/// The details of a payment-provider invoice for a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositInvoice {
    pub user: UserId,
    pub amount: Stars,
    pub title: String,
    pub description: String,
    pub payload: String,
}

impl DepositInvoice {
    pub fn new(payload: DepositPayload) -> Self {
        let amount = payload.amount;
        Self {
            user: payload.user,
            amount,
            title: format!("Deposit of {amount}"),
            description: format!("Adds {amount} to your shop balance"),
            payload: payload.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositReceipt {
    pub deposit: Deposit,
    pub new_balance: Stars,
}
