//! Admin notifications for completed purchases and deposits.
//!
//! These run as event hooks on their own tasks, after the ledger change has been committed. A failure to notify an
//! administrator is logged and goes no further.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use stars_engine::{
    db_types::{NotificationKind, UserId},
    events::{DepositReceivedEvent, EventHooks, PurchaseCompletedEvent},
    LedgerApi,
    SqliteDatabase,
};

use crate::messenger::Messenger;

#[derive(Clone)]
pub struct AdminNotifier {
    ledger: Arc<LedgerApi<SqliteDatabase>>,
    messenger: Arc<dyn Messenger>,
    admins: Arc<Vec<UserId>>,
}

impl AdminNotifier {
    pub fn new(db: SqliteDatabase, messenger: Arc<dyn Messenger>, admins: Vec<UserId>) -> Self {
        Self { ledger: Arc::new(LedgerApi::new(db)), messenger, admins: Arc::new(admins) }
    }

    /// Sends `text` to every administrator who has notifications of `kind` switched on. Returns the number of
    /// administrators reached.
    pub async fn notify(&self, kind: NotificationKind, text: &str) -> usize {
        let recipients = match self.ledger.notification_recipients(&self.admins, kind).await {
            Ok(r) => r,
            Err(e) => {
                error!("📬️ Could not look up who wants {kind} notifications. {e}");
                return 0;
            },
        };
        let mut sent = 0;
        for admin in recipients {
            match self.messenger.send_text(admin, text, None).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("📬️ Could not notify admin #{admin} of {kind}. {e}"),
            }
        }
        sent
    }
}

/// `@handle (id)`, or just the id for users without a chat handle.
fn user_label(user: UserId, username: Option<&str>) -> String {
    match username {
        Some(name) => format!("@{name} ({user})"),
        None => user.to_string(),
    }
}

pub fn purchase_notice(event: &PurchaseCompletedEvent) -> String {
    format!(
        "🔔 New purchase\n🆔 User: {}\n🛍 Product: {}\n💰 Price: {}\n💸 Remaining balance: {}",
        user_label(event.purchase.user_id, event.username.as_deref()),
        event.product.name,
        event.purchase.price,
        event.new_balance
    )
}

pub fn deposit_notice(event: &DepositReceivedEvent) -> String {
    format!(
        "🔔 Balance top-up\n🆔 User: {}\n⭐ Amount: {}\n💰 New balance: {}",
        user_label(event.deposit.user_id, event.username.as_deref()),
        event.deposit.amount,
        event.new_balance
    )
}

/// Hooks that forward every completed purchase and deposit to the interested administrators.
pub fn admin_notification_hooks(notifier: AdminNotifier) -> EventHooks {
    let mut hooks = EventHooks::default();
    let n = notifier.clone();
    hooks.on_purchase_completed(move |ev| {
        let n = n.clone();
        Box::pin(async move {
            let sent = n.notify(NotificationKind::Purchases, &purchase_notice(&ev)).await;
            trace!("📬️ Purchase #{} announced to {sent} admins", ev.purchase.id);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let n = notifier;
    hooks.on_deposit_received(move |ev| {
        let n = n.clone();
        Box::pin(async move {
            let sent = n.notify(NotificationKind::Deposits, &deposit_notice(&ev)).await;
            trace!("📬️ Deposit #{} announced to {sent} admins", ev.deposit.id);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}
