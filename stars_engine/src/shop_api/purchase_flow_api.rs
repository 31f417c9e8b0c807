//! # Purchase and deposit flows
//!
//! A purchase runs `view -> confirm -> finalize`. Finalizing debits the price and writes the purchase log row in one
//! transaction, so there is no window in which a buyer has paid without a record of the sale. Once that commits the
//! purchase is final: statistics, admin notifications and delivery of the file all happen afterwards and their failure
//! never undoes it.
//!
//! A deposit runs `amount entry -> pre-check -> confirmation`. The invoice payload names the user and the amount
//! (see [`DepositPayload`]), and is the only thing the confirmation is trusted to carry.
use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    catalog_cache::CatalogCache,
    db_types::{ProductId, Stars, UserId},
    events::{DepositReceivedEvent, EventProducers, PurchaseCompletedEvent},
    helpers::{parse_positive_amount, DepositPayload, ValidationError, MIN_DEPOSIT},
    shop_api::{
        errors::PurchaseFlowError,
        shop_objects::{DepositInvoice, DepositReceipt, PurchaseQuote, PurchaseReceipt},
    },
    traits::LedgerManagement,
};

pub struct PurchaseFlowApi<B> {
    db: B,
    catalog: Arc<CatalogCache>,
    producers: EventProducers,
}

impl<B> Debug for PurchaseFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PurchaseFlowApi")
    }
}

impl<B> PurchaseFlowApi<B> {
    pub fn new(db: B, catalog: Arc<CatalogCache>, producers: EventProducers) -> Self {
        Self { db, catalog, producers }
    }
}

impl<B> PurchaseFlowApi<B>
where B: LedgerManagement
{
    /// The confirmation step of a purchase. Nothing is written.
    pub async fn quote_purchase(&self, user: UserId, id: ProductId) -> Result<PurchaseQuote, PurchaseFlowError> {
        let product = self.catalog.get(id).ok_or(PurchaseFlowError::ProductNotFound(id))?;
        let balance = self.db.fetch_balance(user).await?;
        if balance < product.price {
            debug!("🔄️🛒️ User #{user} cannot afford product #{id} ({balance} < {})", product.price);
            return Err(PurchaseFlowError::InsufficientFunds { balance, required: product.price });
        }
        let balance_after = balance - product.price;
        Ok(PurchaseQuote { product, balance, balance_after })
    }

    /// Charges the user for the product and records the sale. `username` is only passed on to the
    /// [`PurchaseCompletedEvent`].
    pub async fn finalize_purchase(
        &self,
        user: UserId,
        username: Option<&str>,
        id: ProductId,
    ) -> Result<PurchaseReceipt, PurchaseFlowError> {
        let product = self.catalog.get(id).ok_or(PurchaseFlowError::ProductNotFound(id))?;
        let (purchase, new_balance) = self.db.settle_purchase(user, &product).await?;
        debug!("🔄️🛒️ Purchase #{} of product #{id} by user #{user} committed", purchase.id);
        self.refresh_stats().await;
        let username = username.map(String::from);
        let event = PurchaseCompletedEvent::new(purchase.clone(), product.clone(), new_balance, username);
        self.producers.publish_purchase_completed(event).await;
        Ok(PurchaseReceipt { purchase, product, new_balance })
    }

    /// Builds the invoice for a deposit of `amount`. Deposits below [`MIN_DEPOSIT`] are refused.
    pub fn deposit_invoice(&self, user: UserId, amount: Stars) -> Result<DepositInvoice, ValidationError> {
        if !amount.is_positive() {
            return Err(ValidationError::NotPositive(amount.value()));
        }
        if amount < MIN_DEPOSIT {
            return Err(ValidationError::BelowMinimum { value: amount, minimum: MIN_DEPOSIT });
        }
        trace!("🔄️💰️ Issuing a deposit invoice for {amount} to user #{user}");
        Ok(DepositInvoice::new(DepositPayload::new(user, amount)))
    }

    /// Parses the amount a user typed in the deposit flow and builds the invoice for it.
    pub fn deposit_invoice_from_text(&self, user: UserId, text: &str) -> Result<DepositInvoice, ValidationError> {
        let amount = parse_positive_amount(text)?;
        self.deposit_invoice(user, amount)
    }

    /// Answers the payment provider's pre-check. There is no stock to reserve, so every invoice is accepted.
    pub fn precheck(&self, payload: &str) -> bool {
        debug!("🔄️💰️ Pre-check for invoice {payload} accepted");
        true
    }

    /// Credits a confirmed deposit.
    ///
    /// The provider has already taken the payment by the time this is called, so an unrecognised payload is logged and
    /// dropped rather than reported to the user. In that case `Ok(None)` is returned.
    ///
    /// The amount credited is the one in the payload. `paid` is the total the provider reports, and a mismatch is
    /// logged for follow-up.
    pub async fn confirm_deposit(
        &self,
        payload: &str,
        paid: Stars,
        username: Option<&str>,
    ) -> Result<Option<DepositReceipt>, PurchaseFlowError> {
        let DepositPayload { user, amount } = match payload.parse::<DepositPayload>() {
            Ok(p) => p,
            Err(e) => {
                warn!("🔄️💰️ Ignoring payment confirmation. {e}");
                return Ok(None);
            },
        };
        if paid != amount {
            warn!("🔄️💰️ Invoice {payload} was paid with {paid}. Crediting the invoiced {amount} to user #{user}");
        }
        let (deposit, new_balance) = self.db.settle_deposit(user, amount).await?;
        info!("🔄️💰️ Deposit #{} of {amount} credited to user #{user}", deposit.id);
        self.refresh_stats().await;
        let event = DepositReceivedEvent::new(deposit.clone(), new_balance, username.map(String::from));
        self.producers.publish_deposit_received(event).await;
        Ok(Some(DepositReceipt { deposit, new_balance }))
    }

    async fn refresh_stats(&self) {
        if let Err(e) = self.db.recompute_stats().await {
            error!("🔄️ Could not recompute the shop statistics. {e}");
        }
    }
}
