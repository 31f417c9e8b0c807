//! Typed inline-button payloads.
//!
//! Every inline button carries one [`ButtonAction`] in its callback data, written with `Display` and read back with
//! `FromStr`. Payloads that do not parse are answered as stale menus.
use std::{fmt::Display, str::FromStr};

use stars_engine::db_types::{NotificationKind, ProductField, ProductId};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Unrecognised button payload: {0}")]
pub struct ActionParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Catalog,
    ViewProduct(ProductId),
    Buy(ProductId),
    ConfirmBuy(ProductId),
    Profile,
    PurchaseHistory,
    DepositHistory,
    Deposit,
    MainMenu,
    AdminMenu,
    ManageProducts,
    AddProduct,
    EditProduct,
    EditSelect(ProductId),
    EditField(ProductField),
    DeleteProduct,
    DeleteSelect(ProductId),
    ConfirmDelete(ProductId),
    CancelDelete,
    Stats,
    Notifications,
    ToggleNotification(NotificationKind),
}

impl ButtonAction {
    pub fn is_admin(&self) -> bool {
        use ButtonAction::*;
        matches!(
            self,
            AdminMenu |
                ManageProducts |
                AddProduct |
                EditProduct |
                EditSelect(_) |
                EditField(_) |
                DeleteProduct |
                DeleteSelect(_) |
                ConfirmDelete(_) |
                CancelDelete |
                Stats |
                Notifications |
                ToggleNotification(_)
        )
    }
}

impl Display for ButtonAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ButtonAction::*;
        match self {
            Catalog => write!(f, "catalog"),
            ViewProduct(id) => write!(f, "view:{id}"),
            Buy(id) => write!(f, "buy:{id}"),
            ConfirmBuy(id) => write!(f, "confirm-buy:{id}"),
            Profile => write!(f, "profile"),
            PurchaseHistory => write!(f, "purchases"),
            DepositHistory => write!(f, "deposits"),
            Deposit => write!(f, "deposit"),
            MainMenu => write!(f, "menu"),
            AdminMenu => write!(f, "admin"),
            ManageProducts => write!(f, "manage"),
            AddProduct => write!(f, "add-product"),
            EditProduct => write!(f, "edit-product"),
            EditSelect(id) => write!(f, "edit:{id}"),
            EditField(field) => write!(f, "edit-field:{field}"),
            DeleteProduct => write!(f, "delete-product"),
            DeleteSelect(id) => write!(f, "delete:{id}"),
            ConfirmDelete(id) => write!(f, "confirm-delete:{id}"),
            CancelDelete => write!(f, "cancel-delete"),
            Stats => write!(f, "stats"),
            Notifications => write!(f, "notifications"),
            ToggleNotification(kind) => write!(f, "toggle:{kind}"),
        }
    }
}

impl FromStr for ButtonAction {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ButtonAction::*;
        let err = || ActionParseError(s.to_string());
        let product = |arg: &str| arg.parse::<ProductId>().map_err(|_| err());
        let action = match s.split_once(':') {
            None => match s {
                "catalog" => Catalog,
                "profile" => Profile,
                "purchases" => PurchaseHistory,
                "deposits" => DepositHistory,
                "deposit" => Deposit,
                "menu" => MainMenu,
                "admin" => AdminMenu,
                "manage" => ManageProducts,
                "add-product" => AddProduct,
                "edit-product" => EditProduct,
                "delete-product" => DeleteProduct,
                "cancel-delete" => CancelDelete,
                "stats" => Stats,
                "notifications" => Notifications,
                _ => return Err(err()),
            },
            Some((verb, arg)) => match verb {
                "view" => ViewProduct(product(arg)?),
                "buy" => Buy(product(arg)?),
                "confirm-buy" => ConfirmBuy(product(arg)?),
                "edit" => EditSelect(product(arg)?),
                "edit-field" => EditField(arg.parse().map_err(|_| err())?),
                "delete" => DeleteSelect(product(arg)?),
                "confirm-delete" => ConfirmDelete(product(arg)?),
                "toggle" => ToggleNotification(arg.parse().map_err(|_| err())?),
                _ => return Err(err()),
            },
        };
        Ok(action)
    }
}
