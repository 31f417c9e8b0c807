//! Keyboards and message texts.
//!
//! Everything the bot shows is built here, so the dispatcher only decides *what* to show.
use stars_engine::{
    db_types::{
        Deposit,
        NotificationFlags,
        NotificationKind,
        Product,
        ProductField,
        ProductId,
        PurchaseRecord,
        ShopStats,
        Stars,
    },
    helpers::MIN_DEPOSIT,
    shop_objects::{Profile, PurchaseQuote, PurchaseReceipt},
};
use telegram_tools::data_objects::{InlineKeyboardButton, InlineKeyboardMarkup, ReplyKeyboardMarkup};

use crate::actions::ButtonAction;

pub const CATALOG_LABEL: &str = "🛍 Catalog";
pub const PROFILE_LABEL: &str = "👤 Profile";
pub const SUPPORT_LABEL: &str = "🆘 Support";
pub const ADMIN_LABEL: &str = "⚙️ Admin panel";
pub const MANAGE_LABEL: &str = "📦 Manage products";
pub const STATS_LABEL: &str = "📊 Statistics";
pub const NOTIFICATIONS_LABEL: &str = "📩 Notifications";
pub const BACK_TO_MAIN_LABEL: &str = "🔙 Main menu";

/// A selection from one of the reply keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSelection {
    Catalog,
    Profile,
    Support,
    AdminPanel,
    ManageProducts,
    Stats,
    Notifications,
    MainMenu,
}

impl MenuSelection {
    pub fn from_label(text: &str) -> Option<Self> {
        let selection = match text.trim() {
            CATALOG_LABEL => Self::Catalog,
            PROFILE_LABEL => Self::Profile,
            SUPPORT_LABEL => Self::Support,
            ADMIN_LABEL => Self::AdminPanel,
            MANAGE_LABEL => Self::ManageProducts,
            STATS_LABEL => Self::Stats,
            NOTIFICATIONS_LABEL => Self::Notifications,
            BACK_TO_MAIN_LABEL => Self::MainMenu,
            _ => return None,
        };
        Some(selection)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::AdminPanel | Self::ManageProducts | Self::Stats | Self::Notifications)
    }
}

fn button(text: impl Into<String>, action: ButtonAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

fn product_label(product: &Product) -> String {
    format!("{} - {}", product.name, product.price)
}

//--------------------------------------     Reply menus      ---------------------------------------------------------
pub fn main_menu(is_admin: bool) -> ReplyKeyboardMarkup {
    let mut rows = vec![vec![CATALOG_LABEL, PROFILE_LABEL], vec![SUPPORT_LABEL]];
    if is_admin {
        rows.push(vec![ADMIN_LABEL]);
    }
    ReplyKeyboardMarkup::new(rows)
}

pub fn admin_menu() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup::new(vec![vec![MANAGE_LABEL, STATS_LABEL], vec![NOTIFICATIONS_LABEL], vec![BACK_TO_MAIN_LABEL]])
}

//--------------------------------------       Shopping       ---------------------------------------------------------
pub fn catalog_keyboard(products: &[Product]) -> InlineKeyboardMarkup {
    product_picker(products, ButtonAction::ViewProduct, None)
}

pub fn product_keyboard(id: ProductId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("⭐ Buy", ButtonAction::Buy(id))],
        vec![button("🔙 Back", ButtonAction::Catalog)],
    ])
}

pub fn confirm_purchase_keyboard(id: ProductId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("✅ Confirm", ButtonAction::ConfirmBuy(id))],
        vec![button("❌ Cancel", ButtonAction::ViewProduct(id))],
    ])
}

pub fn continue_shopping_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🛍 Continue shopping", ButtonAction::Catalog)]])
}

pub fn profile_keyboard(support_url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🛒 Purchase history", ButtonAction::PurchaseHistory)],
        vec![button("📈 Deposit history", ButtonAction::DepositHistory)],
        vec![button("⭐ Deposit", ButtonAction::Deposit)],
        vec![InlineKeyboardButton::link(SUPPORT_LABEL, support_url)],
        vec![button("🔙 Back", ButtonAction::MainMenu)],
    ])
}

pub fn back_to_profile_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🔙 Back", ButtonAction::Profile)]])
}

pub fn catalog_text(products: &[Product]) -> String {
    if products.is_empty() {
        "The catalog is empty. Please check back later.".to_string()
    } else {
        "🛍 Choose a product:".to_string()
    }
}

pub fn product_text(product: &Product, balance: Stars) -> String {
    format!(
        "{}\n\n{}\n\n⭐ Price: {}\n🆔 Product id: {}\n\nYour balance: {balance}",
        product.name, product.description, product.price, product.id
    )
}

pub fn purchase_quote_text(quote: &PurchaseQuote) -> String {
    format!(
        "✅ Confirm your purchase\n\nProduct: {}\nPrice: {}\n\nYour balance: {}\nRemaining after purchase: {}",
        quote.product.name, quote.product.price, quote.balance, quote.balance_after
    )
}

pub fn purchase_done_text(receipt: &PurchaseReceipt) -> String {
    format!("✅ Purchase of {} for {} complete!", receipt.product.name, receipt.purchase.price)
}

pub fn delivery_caption(receipt: &PurchaseReceipt) -> String {
    format!(
        "✅ Thank you for your purchase! Here is {}.\n⭐ Remaining balance: {}",
        receipt.product.name, receipt.new_balance
    )
}

pub fn delivery_failed_text(receipt: &PurchaseReceipt, support: &str) -> String {
    format!(
        "✅ Purchase of {} for {} complete!\n⚠️ The file could not be sent. Please contact {support}.",
        receipt.product.name, receipt.purchase.price
    )
}

pub fn welcome_text(profile: &Profile) -> String {
    format!("👋 Welcome to the shop!\n\n⭐ Your balance: {}\n\nUse the menu below to get started.", profile.balance)
}

pub fn profile_text(profile: &Profile) -> String {
    format!(
        "👤 Your profile\n\n🆔 Id: {}\n⭐ Balance: {}\n🛍 Products bought: {}",
        profile.user, profile.balance, profile.purchase_count
    )
}

pub fn purchase_history_text(records: &[PurchaseRecord]) -> String {
    if records.is_empty() {
        return "🛒 You haven't bought anything yet.".to_string();
    }
    let entries = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let price = if r.product_exists() { format!("\n   💫 Price: {}", r.price) } else { String::default() };
            format!(
                "{}. {}{price}\n   🕒 Date: {}\n   🆔 Product: {}",
                i + 1,
                r.display_name(),
                r.created_at.format("%Y-%m-%d %H:%M"),
                r.product_id
            )
        })
        .collect::<Vec<_>>();
    format!("🛒 Your recent purchases:\n\n{}", entries.join("\n\n"))
}

pub fn deposit_history_text(deposits: &[Deposit]) -> String {
    if deposits.is_empty() {
        return "📈 You haven't made any deposits yet.".to_string();
    }
    let entries = deposits
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}. +{}\n   🕒 {}", i + 1, d.amount, d.created_at.format("%Y-%m-%d %H:%M")))
        .collect::<Vec<_>>();
    format!("📈 Your recent deposits:\n\n{}", entries.join("\n"))
}

pub fn deposit_prompt_text() -> String {
    format!("⭐ How many stars would you like to deposit? (min. {})", MIN_DEPOSIT.value())
}

pub fn support_text(support: &str) -> String {
    format!("If you have any questions or problems, please contact our support: {support}")
}

pub fn help_text(is_admin: bool) -> String {
    let mut text = String::from(
        "/start - open the main menu\n/shop - browse the catalog\n/help - show this message\n\nYou can top up your \
         balance from your profile.",
    );
    if is_admin {
        text.push_str(
            "\n\nAdministrator commands:\n/grant <user id> <amount> - add stars to a balance\n/revoke <user id> \
             <amount> - remove stars from a balance\n/stats - shop statistics",
        );
    }
    text
}

//--------------------------------------    Administration    ---------------------------------------------------------
pub fn manage_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("➕ Add product", ButtonAction::AddProduct)],
        vec![button("✏️ Edit product", ButtonAction::EditProduct)],
        vec![button("🗑 Delete product", ButtonAction::DeleteProduct)],
        vec![button("🔙 Back", ButtonAction::AdminMenu)],
    ])
}

/// One button per product, followed by an optional back button.
pub fn product_picker<F>(products: &[Product], action: F, back: Option<ButtonAction>) -> InlineKeyboardMarkup
where F: Fn(ProductId) -> ButtonAction {
    let mut rows = products.iter().map(|p| vec![button(product_label(p), action(p.id))]).collect::<Vec<_>>();
    if let Some(back) = back {
        rows.push(vec![button("🔙 Back", back)]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn back_to_admin_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🔙 Back", ButtonAction::AdminMenu)]])
}

pub fn edit_field_keyboard() -> InlineKeyboardMarkup {
    let field = |text: &str, field: ProductField| vec![button(text, ButtonAction::EditField(field))];
    InlineKeyboardMarkup::new(vec![
        field("✏️ Name", ProductField::Name),
        field("⭐ Price", ProductField::Price),
        field("📝 Description", ProductField::Description),
        field("📁 File", ProductField::Asset),
        vec![button("🔙 Back", ButtonAction::EditProduct)],
    ])
}

pub fn confirm_delete_keyboard(id: ProductId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("✅ Yes, delete", ButtonAction::ConfirmDelete(id))],
        vec![button("❌ No, cancel", ButtonAction::CancelDelete)],
    ])
}

pub fn confirm_delete_text(product: &Product) -> String {
    format!("Are you sure you want to delete this product?\n\n{}\n\nThis cannot be undone!", product_label(product))
}

pub fn edit_value_prompt(field: ProductField) -> String {
    match field {
        ProductField::Asset => "Send the new product file as a document:".to_string(),
        other => format!("Enter the new {other}:"),
    }
}

pub fn stats_text(stats: &ShopStats) -> String {
    format!(
        "📊 Shop statistics\n\n🛍 Purchases: {}\n⭐ Total deposited: {}\n👥 Users: {}",
        stats.total_purchases, stats.total_deposited, stats.total_users
    )
}

pub fn notifications_keyboard(flags: NotificationFlags) -> InlineKeyboardMarkup {
    let toggle = |kind: NotificationKind, text: &str| {
        let state = if flags.is_enabled(kind) { "enabled" } else { "disabled" };
        vec![button(format!("🔔 {text} notifications {state}"), ButtonAction::ToggleNotification(kind))]
    };
    InlineKeyboardMarkup::new(vec![
        toggle(NotificationKind::Purchases, "Purchase"),
        toggle(NotificationKind::Deposits, "Deposit"),
        vec![button("🔙 Back", ButtonAction::AdminMenu)],
    ])
}

pub fn notifications_text() -> String {
    "📩 Choose which notifications you receive:".to_string()
}
