//! # Multi-step flows
//!
//! Some interactions take several messages to complete: adding a product asks for a name, a price, a description and
//! finally a file. The step a user is on is tracked here, one [`FlowState`] per user, in a [`SessionStore`].
//!
//! Text handling for each step is pure: a step consumes the text and either advances to the next step, or rejects the
//! text with a [`ValidationError`] so that the caller can re-prompt without leaving the step.
//!
//! There are no timeouts. A flow stays pending until it completes, another flow replaces it, or the session is cleared
//! by an unrelated command.
use dashmap::DashMap;
use log::*;

use crate::{
    db_types::{NewProduct, ProductField, ProductId, Stars, UserId},
    helpers::{parse_positive_amount, ValidationError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddProductStep {
    AwaitingName,
    AwaitingPrice { name: String },
    AwaitingDescription { name: String, price: Stars },
    AwaitingFile { name: String, price: Stars, description: String },
}

impl AddProductStep {
    /// Consumes a text message. The final step needs a file, so text is rejected there.
    pub fn on_text(&self, text: &str) -> Result<AddProductStep, ValidationError> {
        let text = text.trim();
        match self {
            AddProductStep::AwaitingName => {
                non_empty(text, "product name")?;
                Ok(AddProductStep::AwaitingPrice { name: text.to_string() })
            },
            AddProductStep::AwaitingPrice { name } => {
                let price = parse_positive_amount(text)?;
                Ok(AddProductStep::AwaitingDescription { name: name.clone(), price })
            },
            AddProductStep::AwaitingDescription { name, price } => {
                non_empty(text, "description")?;
                Ok(AddProductStep::AwaitingFile { name: name.clone(), price: *price, description: text.to_string() })
            },
            AddProductStep::AwaitingFile { .. } => Err(ValidationError::MissingValue("file")),
        }
    }

    /// Builds the new product once the file has been stored. Returns `None` if the flow is not at the file step.
    pub fn complete(self, asset_ref: String) -> Option<NewProduct> {
        match self {
            AddProductStep::AwaitingFile { name, price, description } => {
                Some(NewProduct { name, price, description, asset_ref })
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditProductStep {
    SelectProduct,
    SelectField { product: ProductId },
    AwaitingValue { product: ProductId, field: ProductField },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteProductStep {
    SelectProduct,
    Confirm { product: ProductId },
}

/// The flow a user is in the middle of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    AddProduct(AddProductStep),
    EditProduct(EditProductStep),
    DeleteProduct(DeleteProductStep),
    /// Waiting for the user to type the amount they want to deposit.
    DepositAmount,
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::AddProduct(_) => "add product",
            FlowState::EditProduct(_) => "edit product",
            FlowState::DeleteProduct(_) => "delete product",
            FlowState::DepositAmount => "deposit",
        }
    }

    /// Whether the flow may only be run by an administrator.
    pub fn is_admin_flow(&self) -> bool {
        !matches!(self, FlowState::DepositAmount)
    }
}

fn non_empty(text: &str, what: &'static str) -> Result<(), ValidationError> {
    if text.is_empty() {
        Err(ValidationError::MissingValue(what))
    } else {
        Ok(())
    }
}

/// Per-user flow state. Safe to share between concurrently running handlers.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, FlowState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: UserId) -> Option<FlowState> {
        self.sessions.get(&user).map(|s| s.value().clone())
    }

    /// Starts or advances a flow, replacing whatever the user was doing before.
    pub fn set(&self, user: UserId, state: FlowState) {
        trace!("🔄️ User #{user} is now in the {} flow: {state:?}", state.name());
        self.sessions.insert(user, state);
    }

    /// Abandons the current flow, if any.
    pub fn clear(&self, user: UserId) -> Option<FlowState> {
        let old = self.sessions.remove(&user).map(|(_, s)| s);
        if let Some(s) = &old {
            debug!("🔄️ User #{user} left the {} flow", s.name());
        }
        old
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
