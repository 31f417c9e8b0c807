use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
pub use stars_common::Stars;
use thiserror::Error;

/// The name shown for purchase history rows whose product no longer exists.
pub const DELETED_PRODUCT_NAME: &str = "deleted product";

#[derive(Debug, Clone, Error)]
#[error("Invalid identifier: {0}")]
pub struct IdParseError(String);

//--------------------------------------        UserId        ---------------------------------------------------------
/// The platform-assigned user identifier. It doubles as the chat id for private conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for UserId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| IdParseError(format!("{s}: {e}")))
    }
}

//--------------------------------------       ProductId      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for ProductId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| IdParseError(format!("{s}: {e}")))
    }
}

//--------------------------------------   NotificationFlags  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    Purchases,
    Deposits,
}

impl NotificationKind {
    pub fn bit(&self) -> i64 {
        match self {
            NotificationKind::Purchases => 0b01,
            NotificationKind::Deposits => 0b10,
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Purchases => write!(f, "purchases"),
            NotificationKind::Deposits => write!(f, "deposits"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchases" => Ok(Self::Purchases),
            "deposits" => Ok(Self::Deposits),
            _ => Err(IdParseError(format!("{s} is not a notification kind"))),
        }
    }
}

/// Per-user notification switches. Bit 0 enables purchase notifications, bit 1 enables deposit notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct NotificationFlags(i64);

impl Default for NotificationFlags {
    fn default() -> Self {
        Self(0b11)
    }
}

impl From<i64> for NotificationFlags {
    fn from(value: i64) -> Self {
        Self(value & 0b11)
    }
}

impl NotificationFlags {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_enabled(&self, kind: NotificationKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Flips the bit for `kind`, leaving the other bit untouched.
    pub fn toggle(self, kind: NotificationKind) -> Self {
        Self(self.0 ^ kind.bit())
    }
}

//--------------------------------------     UserAccount      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: UserId,
    pub balance: Stars,
    pub notification_flags: NotificationFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Product       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Stars,
    pub description: String,
    /// Path of the stored asset file, as issued by the asset store.
    pub asset_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Stars,
    pub description: String,
    pub asset_ref: String,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Stars, description: S, asset_ref: S) -> Self {
        Self { name: name.into(), price, description: description.into(), asset_ref: asset_ref.into() }
    }
}

/// The product attributes an administrator can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductField {
    Name,
    Price,
    Description,
    Asset,
}

impl ProductField {
    pub fn label(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Price => "price",
            ProductField::Description => "description",
            ProductField::Asset => "file",
        }
    }
}

impl Display for ProductField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductField {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "description" => Ok(Self::Description),
            "file" => Ok(Self::Asset),
            _ => Err(IdParseError(format!("{s} is not an editable product field"))),
        }
    }
}

/// A typed, single-field modification of a product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductUpdate {
    Name(String),
    Price(Stars),
    Description(String),
    Asset(String),
}

impl ProductUpdate {
    pub fn field(&self) -> ProductField {
        match self {
            ProductUpdate::Name(_) => ProductField::Name,
            ProductUpdate::Price(_) => ProductField::Price,
            ProductUpdate::Description(_) => ProductField::Description,
            ProductUpdate::Asset(_) => ProductField::Asset,
        }
    }
}

//--------------------------------------       Purchase       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Purchase {
    pub id: i64,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// The price paid at the time of purchase.
    pub price: Stars,
    pub created_at: DateTime<Utc>,
}

/// A purchase log entry joined with whatever is left of its product.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PurchaseRecord {
    pub id: i64,
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub price: Stars,
    pub created_at: DateTime<Utc>,
}

impl PurchaseRecord {
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or(DELETED_PRODUCT_NAME)
    }

    pub fn product_exists(&self) -> bool {
        self.product_name.is_some()
    }
}

//--------------------------------------        Deposit       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Deposit {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Stars,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       ShopStats      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ShopStats {
    pub total_purchases: i64,
    pub total_deposited: Stars,
    pub total_users: i64,
    pub last_updated: DateTime<Utc>,
}
