//! # Dispatcher
//!
//! Routes each [`InboundEvent`] to the engine operation it stands for and renders the outcome back to the user.
//!
//! Failures are collected as [`DispatchError`]s and reported in one place ([`Dispatcher::report`]), which turns each
//! one into exactly one notice for the user. Failures to *deliver* something to the user (a message, the purchased
//! file, a gift notice) never undo the ledger change that preceded them; they are logged instead.
//!
//! Any command, and any selection from the reply-keyboard menus, abandons the multi-step flow the user was in.
use std::{path::Path, sync::Arc};

use log::*;
use stars_engine::{
    assets::AssetStore,
    db_types::{ProductField, ProductId, ProductUpdate, Stars, UserId},
    events::EventProducers,
    flow_state::{AddProductStep, DeleteProductStep, EditProductStep, FlowState, SessionStore},
    helpers::{parse_positive_amount, parse_user_and_amount, ValidationError},
    shop_objects::PurchaseReceipt,
    CatalogApi,
    LedgerApi,
    LedgerError,
    PurchaseFlowApi,
    StoreDatabase,
};
use telegram_tools::data_objects::{InlineKeyboardMarkup, ReplyMarkup};

use crate::{
    actions::ButtonAction,
    config::BotConfig,
    errors::DispatchError,
    inbound::{Command, InboundEvent},
    menus::{self, MenuSelection},
    messenger::Messenger,
};

pub struct Dispatcher<B> {
    ledger: LedgerApi<B>,
    catalog: CatalogApi<B>,
    flow: PurchaseFlowApi<B>,
    sessions: SessionStore,
    messenger: Arc<dyn Messenger>,
    config: BotConfig,
}

impl<B> Dispatcher<B>
where B: StoreDatabase
{
    pub fn new(
        db: B,
        assets: AssetStore,
        producers: EventProducers,
        messenger: Arc<dyn Messenger>,
        config: BotConfig,
    ) -> Self {
        let catalog = CatalogApi::new(db.clone(), assets);
        let flow = PurchaseFlowApi::new(db.clone(), catalog.cache(), producers);
        let ledger = LedgerApi::new(db);
        Self { ledger, catalog, flow, sessions: SessionStore::new(), messenger, config }
    }

    pub fn catalog(&self) -> &CatalogApi<B> {
        &self.catalog
    }

    pub fn ledger(&self) -> &LedgerApi<B> {
        &self.ledger
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub async fn dispatch(&self, event: InboundEvent) {
        let user = event.user();
        trace!("🤖️ Dispatching {event:?}");
        let result = match event {
            InboundEvent::Command { command, .. } => self.on_command(user, command).await,
            InboundEvent::Text { text, .. } => self.on_text(user, &text).await,
            InboundEvent::Upload { file_handle, file_name, .. } => {
                self.on_upload(user, &file_handle, &file_name).await
            },
            InboundEvent::Button { callback_id, message_id, payload, username, .. } => {
                self.on_button(user, username.as_deref(), &callback_id, message_id, &payload).await
            },
            InboundEvent::PreCheckout { query_id, payload, .. } => self.on_pre_checkout(&query_id, &payload).await,
            InboundEvent::PaymentConfirmed { payload, amount, username, .. } => {
                self.on_payment_confirmed(user, username.as_deref(), &payload, Stars::from(amount)).await
            },
        };
        if let Err(e) = result {
            self.report(user, e).await;
        }
    }

    /// Turns a failure into the one notice the user sees.
    async fn report(&self, user: UserId, error: DispatchError) {
        let notice = error.user_message(&self.config.support_username);
        match &error {
            DispatchError::Persistence(_) => {
                error!("🤖️ Request from user #{user} failed. {error}");
                self.send(user, &notice, None).await;
            },
            DispatchError::NotFound(_) => {
                // The flow that referred to the product cannot continue. Fall back to browsing.
                self.sessions.clear(user);
                let products = self.catalog.products();
                let text = format!("{notice}\n\n{}", menus::catalog_text(&products));
                self.send(user, &text, Some(menus::catalog_keyboard(&products).into())).await;
            },
            DispatchError::Unauthorized => {
                self.sessions.clear(user);
                self.send(user, &notice, None).await;
            },
            _ => self.send(user, &notice, None).await,
        }
    }

    //------------------------------------------   Commands   --------------------------------------------------------
    async fn on_command(&self, user: UserId, command: Command) -> Result<(), DispatchError> {
        debug!("🤖️ User #{user} sent {command}");
        self.sessions.clear(user);
        match command {
            Command::Start => self.start(user).await,
            Command::Shop => {
                self.show_catalog(user, None).await;
                Ok(())
            },
            Command::Grant(args) => self.grant(user, &args).await,
            Command::Revoke(args) => self.revoke(user, &args).await,
            Command::Stats => self.show_stats(user, None).await,
            Command::Help => {
                let text = menus::help_text(self.is_admin(user));
                self.send(user, &text, None).await;
                Ok(())
            },
            Command::Unknown(_) => {
                self.send(user, "Unknown command. Send /help to see what I can do.", None).await;
                Ok(())
            },
        }
    }

    async fn start(&self, user: UserId) -> Result<(), DispatchError> {
        self.ledger.start_session(user).await?;
        let profile = self.ledger.profile(user).await?;
        let keyboard = menus::main_menu(self.is_admin(user));
        self.send(user, &menus::welcome_text(&profile), Some(keyboard.into())).await;
        Ok(())
    }

    async fn grant(&self, admin: UserId, args: &str) -> Result<(), DispatchError> {
        self.require_admin(admin)?;
        let (recipient, amount) = parse_user_and_amount(args)?;
        let balance = self.ledger.grant(recipient, amount).await?;
        let text = format!("✅ Granted {amount} to user {recipient}. New balance: {balance}");
        self.send(admin, &text, None).await;
        let gift = format!("🎁 You received {amount} as a gift! New balance: {balance}");
        self.send(recipient, &gift, None).await;
        Ok(())
    }

    async fn revoke(&self, admin: UserId, args: &str) -> Result<(), DispatchError> {
        self.require_admin(admin)?;
        let (target, amount) = parse_user_and_amount(args)?;
        let text = match self.ledger.revoke(target, amount).await {
            Ok(balance) => format!("✅ Removed {amount} from user {target}. New balance: {balance}"),
            Err(LedgerError::InsufficientFunds { balance, .. }) => {
                format!("❌ User {target} does not have enough stars. Current balance: {balance}")
            },
            Err(e) => return Err(e.into()),
        };
        self.send(admin, &text, None).await;
        Ok(())
    }

    //------------------------------------------     Text     --------------------------------------------------------
    async fn on_text(&self, user: UserId, text: &str) -> Result<(), DispatchError> {
        if let Some(selection) = MenuSelection::from_label(text) {
            self.sessions.clear(user);
            return self.on_menu(user, selection).await;
        }
        match self.sessions.get(user) {
            Some(FlowState::AddProduct(step)) => self.add_product_text(user, step, text).await,
            Some(FlowState::EditProduct(EditProductStep::AwaitingValue { product, field })) => {
                self.edit_product_text(user, product, field, text).await
            },
            Some(FlowState::DepositAmount) => self.deposit_amount(user, text).await,
            Some(_) => {
                self.send(user, "Please use the buttons above.", None).await;
                Ok(())
            },
            None => {
                let keyboard = menus::main_menu(self.is_admin(user));
                self.send(user, "Please choose an option from the menu.", Some(keyboard.into())).await;
                Ok(())
            },
        }
    }

    async fn on_menu(&self, user: UserId, selection: MenuSelection) -> Result<(), DispatchError> {
        if selection.is_admin() {
            self.require_admin(user)?;
        }
        match selection {
            MenuSelection::Catalog => self.show_catalog(user, None).await,
            MenuSelection::Profile => return self.show_profile(user, None).await,
            MenuSelection::Support => {
                let text = menus::support_text(&self.config.support_username);
                self.send(user, &text, None).await;
            },
            MenuSelection::AdminPanel => self.send(user, "⚙️ Admin panel", Some(menus::admin_menu().into())).await,
            MenuSelection::ManageProducts => {
                self.send(user, "📦 Product management", Some(menus::manage_keyboard().into())).await
            },
            MenuSelection::Stats => return self.show_stats(user, None).await,
            MenuSelection::Notifications => return self.show_notifications(user, None).await,
            MenuSelection::MainMenu => {
                let keyboard = menus::main_menu(self.is_admin(user));
                self.send(user, "Main menu", Some(keyboard.into())).await;
            },
        }
        Ok(())
    }

    async fn add_product_text(&self, user: UserId, step: AddProductStep, text: &str) -> Result<(), DispatchError> {
        self.require_admin(user)?;
        let next = step.on_text(text)?;
        let prompt = match &next {
            AddProductStep::AwaitingName => "Enter the product name:",
            AddProductStep::AwaitingPrice { .. } => "Enter the price in stars:",
            AddProductStep::AwaitingDescription { .. } => "Enter the product description:",
            AddProductStep::AwaitingFile { .. } => "Send the product file as a document:",
        };
        self.sessions.set(user, FlowState::AddProduct(next));
        self.send(user, prompt, None).await;
        Ok(())
    }

    async fn edit_product_text(
        &self,
        user: UserId,
        product: ProductId,
        field: ProductField,
        text: &str,
    ) -> Result<(), DispatchError> {
        self.require_admin(user)?;
        let text = text.trim();
        let update = match field {
            ProductField::Name if !text.is_empty() => ProductUpdate::Name(text.to_string()),
            ProductField::Description if !text.is_empty() => ProductUpdate::Description(text.to_string()),
            ProductField::Price => ProductUpdate::Price(parse_positive_amount(text)?),
            ProductField::Asset => return Err(ValidationError::MissingValue("file").into()),
            _ => return Err(ValidationError::MissingValue(field.label()).into()),
        };
        let updated = self.catalog.update_product(product, update).await?;
        self.sessions.clear(user);
        let text = format!("✅ The {field} of \"{}\" has been updated.", updated.name);
        self.send(user, &text, Some(menus::admin_menu().into())).await;
        Ok(())
    }

    async fn deposit_amount(&self, user: UserId, text: &str) -> Result<(), DispatchError> {
        let invoice = self.flow.deposit_invoice_from_text(user, text)?;
        self.sessions.clear(user);
        self.messenger.send_invoice(user, &invoice).await?;
        Ok(())
    }

    //------------------------------------------    Uploads   --------------------------------------------------------
    async fn on_upload(&self, user: UserId, file_handle: &str, file_name: &str) -> Result<(), DispatchError> {
        match self.sessions.get(user) {
            Some(FlowState::AddProduct(step @ AddProductStep::AwaitingFile { .. })) => {
                self.require_admin(user)?;
                let contents = self.messenger.download_file(file_handle).await?;
                let asset_ref = self.catalog.store_asset(file_handle, file_name, &contents).await?;
                // The step was matched as the file step above, so this always yields a product
                let new_product = step.complete(asset_ref).ok_or(DispatchError::StaleAction)?;
                let product = self.catalog.add_product(new_product).await?;
                self.sessions.clear(user);
                let text = format!("✅ Product \"{}\" added!", product.name);
                self.send(user, &text, Some(menus::admin_menu().into())).await;
                Ok(())
            },
            Some(FlowState::EditProduct(EditProductStep::AwaitingValue { product, field: ProductField::Asset })) => {
                self.require_admin(user)?;
                let contents = self.messenger.download_file(file_handle).await?;
                let updated = self.catalog.replace_asset(product, file_handle, file_name, &contents).await?;
                self.sessions.clear(user);
                let text = format!("✅ The file of \"{}\" has been replaced.", updated.name);
                self.send(user, &text, Some(menus::admin_menu().into())).await;
                Ok(())
            },
            _ => {
                debug!("🤖️ Ignoring unexpected upload {file_name} from user #{user}");
                self.send(user, "I wasn't expecting a file. Please use the menu.", None).await;
                Ok(())
            },
        }
    }

    //------------------------------------------    Buttons   --------------------------------------------------------
    async fn on_button(
        &self,
        user: UserId,
        username: Option<&str>,
        callback_id: &str,
        message_id: Option<i64>,
        payload: &str,
    ) -> Result<(), DispatchError> {
        if let Err(e) = self.messenger.answer_callback(callback_id, None).await {
            warn!("🤖️ Could not answer button press {callback_id}. {e}");
        }
        let action = payload.parse::<ButtonAction>().map_err(|e| {
            debug!("🤖️ {e}");
            DispatchError::StaleAction
        })?;
        if action.is_admin() {
            self.require_admin(user)?;
        }
        match action {
            ButtonAction::Catalog => self.show_catalog(user, message_id).await,
            ButtonAction::ViewProduct(id) => return self.view_product(user, id, message_id).await,
            ButtonAction::Buy(id) => return self.quote_purchase(user, id, message_id).await,
            ButtonAction::ConfirmBuy(id) => return self.finalize_purchase(user, username, id, message_id).await,
            ButtonAction::Profile => return self.show_profile(user, message_id).await,
            ButtonAction::PurchaseHistory => {
                let records = self.ledger.purchase_history(user).await?;
                let text = menus::purchase_history_text(&records);
                self.show(user, message_id, &text, menus::back_to_profile_keyboard()).await;
            },
            ButtonAction::DepositHistory => {
                let deposits = self.ledger.deposit_history(user).await?;
                let text = menus::deposit_history_text(&deposits);
                self.show(user, message_id, &text, menus::back_to_profile_keyboard()).await;
            },
            ButtonAction::Deposit => {
                self.sessions.set(user, FlowState::DepositAmount);
                self.send(user, &menus::deposit_prompt_text(), None).await;
            },
            ButtonAction::MainMenu => {
                self.sessions.clear(user);
                let keyboard = menus::main_menu(self.is_admin(user));
                self.send(user, "Main menu", Some(keyboard.into())).await;
            },
            ButtonAction::AdminMenu => {
                self.sessions.clear(user);
                self.send(user, "⚙️ Admin panel", Some(menus::admin_menu().into())).await;
            },
            ButtonAction::ManageProducts => {
                self.show(user, message_id, "📦 Product management", menus::manage_keyboard()).await;
            },
            ButtonAction::AddProduct => {
                self.sessions.set(user, FlowState::AddProduct(AddProductStep::AwaitingName));
                self.send(user, "Enter the product name:", None).await;
            },
            ButtonAction::EditProduct => {
                self.sessions.set(user, FlowState::EditProduct(EditProductStep::SelectProduct));
                self.show_product_picker(user, message_id, "Choose a product to edit:", ButtonAction::EditSelect)
                    .await;
            },
            ButtonAction::EditSelect(id) => {
                let product = self.catalog.product(id).ok_or(DispatchError::NotFound(id))?;
                self.sessions.set(user, FlowState::EditProduct(EditProductStep::SelectField { product: id }));
                let text = format!("Editing \"{}\". Choose the field to change:", product.name);
                self.show(user, message_id, &text, menus::edit_field_keyboard()).await;
            },
            ButtonAction::EditField(field) => return self.select_edit_field(user, field).await,
            ButtonAction::DeleteProduct | ButtonAction::CancelDelete => {
                self.sessions.set(user, FlowState::DeleteProduct(DeleteProductStep::SelectProduct));
                self.show_product_picker(user, message_id, "Choose a product to delete:", ButtonAction::DeleteSelect)
                    .await;
            },
            ButtonAction::DeleteSelect(id) => {
                let product = self.catalog.product(id).ok_or(DispatchError::NotFound(id))?;
                self.sessions.set(user, FlowState::DeleteProduct(DeleteProductStep::Confirm { product: id }));
                let text = menus::confirm_delete_text(&product);
                self.show(user, message_id, &text, menus::confirm_delete_keyboard(id)).await;
            },
            ButtonAction::ConfirmDelete(id) => return self.delete_product(user, id, message_id).await,
            ButtonAction::Stats => return self.show_stats(user, message_id).await,
            ButtonAction::Notifications => return self.show_notifications(user, message_id).await,
            ButtonAction::ToggleNotification(kind) => {
                let flags = self.ledger.toggle_notification(user, kind).await?;
                self.show(user, message_id, &menus::notifications_text(), menus::notifications_keyboard(flags)).await;
            },
        }
        Ok(())
    }

    async fn select_edit_field(&self, user: UserId, field: ProductField) -> Result<(), DispatchError> {
        let product = match self.sessions.get(user) {
            Some(FlowState::EditProduct(EditProductStep::SelectField { product })) |
            Some(FlowState::EditProduct(EditProductStep::AwaitingValue { product, .. })) => product,
            _ => return Err(DispatchError::StaleAction),
        };
        self.sessions.set(user, FlowState::EditProduct(EditProductStep::AwaitingValue { product, field }));
        self.send(user, &menus::edit_value_prompt(field), None).await;
        Ok(())
    }

    async fn delete_product(&self, user: UserId, id: ProductId, message_id: Option<i64>) -> Result<(), DispatchError> {
        match self.sessions.get(user) {
            Some(FlowState::DeleteProduct(DeleteProductStep::Confirm { product })) if product == id => {},
            _ => return Err(DispatchError::StaleAction),
        }
        let product = self.catalog.delete_product(id).await?;
        self.sessions.clear(user);
        let text = format!("✅ Product \"{}\" deleted.", product.name);
        self.show(user, message_id, &text, menus::manage_keyboard()).await;
        Ok(())
    }

    //------------------------------------------   Purchases  --------------------------------------------------------
    async fn view_product(&self, user: UserId, id: ProductId, message_id: Option<i64>) -> Result<(), DispatchError> {
        let product = self.catalog.product(id).ok_or(DispatchError::NotFound(id))?;
        let balance = self.ledger.balance(user).await?;
        let text = menus::product_text(&product, balance);
        self.show(user, message_id, &text, menus::product_keyboard(id)).await;
        Ok(())
    }

    async fn quote_purchase(&self, user: UserId, id: ProductId, message_id: Option<i64>) -> Result<(), DispatchError> {
        let quote = self.flow.quote_purchase(user, id).await?;
        let text = menus::purchase_quote_text(&quote);
        self.show(user, message_id, &text, menus::confirm_purchase_keyboard(id)).await;
        Ok(())
    }

    async fn finalize_purchase(
        &self,
        user: UserId,
        username: Option<&str>,
        id: ProductId,
        message_id: Option<i64>,
    ) -> Result<(), DispatchError> {
        let receipt = self.flow.finalize_purchase(user, username, id).await?;
        let text = menus::purchase_done_text(&receipt);
        self.show(user, message_id, &text, menus::continue_shopping_keyboard()).await;
        self.deliver(user, &receipt).await;
        Ok(())
    }

    /// Sends the purchased file. The purchase is already final, so a failure only earns the buyer a fallback notice.
    async fn deliver(&self, user: UserId, receipt: &PurchaseReceipt) {
        let asset_ref = &receipt.product.asset_ref;
        let result = match self.catalog.assets().read(asset_ref).await {
            Ok(contents) => {
                let file_name = Path::new(asset_ref)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| receipt.product.name.clone());
                let caption = menus::delivery_caption(receipt);
                self.messenger
                    .send_document(user, &file_name, contents, Some(caption.as_str()))
                    .await
                    .map_err(|e| e.to_string())
            },
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => info!("🤖️ Delivered product #{} to user #{user}", receipt.product.id),
            Err(e) => {
                error!("🤖️ Could not deliver product #{} to user #{user}. {e}", receipt.product.id);
                let text = menus::delivery_failed_text(receipt, &self.config.support_username);
                self.send(user, &text, None).await;
            },
        }
    }

    //------------------------------------------   Deposits   --------------------------------------------------------
    async fn on_pre_checkout(&self, query_id: &str, payload: &str) -> Result<(), DispatchError> {
        let ok = self.flow.precheck(payload);
        if let Err(e) = self.messenger.answer_pre_checkout(query_id, ok).await {
            error!("🤖️ Could not answer pre-checkout query {query_id}. {e}");
        }
        Ok(())
    }

    async fn on_payment_confirmed(
        &self,
        user: UserId,
        username: Option<&str>,
        payload: &str,
        paid: Stars,
    ) -> Result<(), DispatchError> {
        if let Some(receipt) = self.flow.confirm_deposit(payload, paid, username).await? {
            let text = format!(
                "✅ Your balance was topped up by {}!\n⭐ Current balance: {}",
                receipt.deposit.amount, receipt.new_balance
            );
            self.send(receipt.deposit.user_id, &text, None).await;
        } else {
            debug!("🤖️ Payment confirmation from user #{user} was not credited");
        }
        Ok(())
    }

    //------------------------------------------    Screens   --------------------------------------------------------
    async fn show_catalog(&self, user: UserId, message_id: Option<i64>) {
        let products = self.catalog.products();
        let text = menus::catalog_text(&products);
        self.show(user, message_id, &text, menus::catalog_keyboard(&products)).await;
    }

    async fn show_profile(&self, user: UserId, message_id: Option<i64>) -> Result<(), DispatchError> {
        let profile = self.ledger.profile(user).await?;
        let keyboard = menus::profile_keyboard(&self.config.support_url());
        self.show(user, message_id, &menus::profile_text(&profile), keyboard).await;
        Ok(())
    }

    async fn show_stats(&self, user: UserId, message_id: Option<i64>) -> Result<(), DispatchError> {
        self.require_admin(user)?;
        let stats = self.ledger.stats().await?;
        self.show(user, message_id, &menus::stats_text(&stats), menus::back_to_admin_keyboard()).await;
        Ok(())
    }

    async fn show_notifications(&self, user: UserId, message_id: Option<i64>) -> Result<(), DispatchError> {
        let flags = self.ledger.notification_flags(user).await?;
        self.show(user, message_id, &menus::notifications_text(), menus::notifications_keyboard(flags)).await;
        Ok(())
    }

    async fn show_product_picker<F>(&self, user: UserId, message_id: Option<i64>, title: &str, action: F)
    where F: Fn(ProductId) -> ButtonAction {
        let products = self.catalog.products();
        if products.is_empty() {
            self.show(user, message_id, "There are no products yet.", menus::manage_keyboard()).await;
            return;
        }
        let keyboard = menus::product_picker(&products, action, Some(ButtonAction::ManageProducts));
        self.show(user, message_id, title, keyboard).await;
    }

    //------------------------------------------   Plumbing   --------------------------------------------------------
    fn is_admin(&self, user: UserId) -> bool {
        self.config.is_admin(user)
    }

    fn require_admin(&self, user: UserId) -> Result<(), DispatchError> {
        if self.is_admin(user) {
            Ok(())
        } else {
            Err(DispatchError::Unauthorized)
        }
    }

    async fn send(&self, user: UserId, text: &str, markup: Option<ReplyMarkup>) {
        if let Err(e) = self.messenger.send_text(user, text, markup).await {
            warn!("🤖️ Could not send a message to user #{user}. {e}");
        }
    }

    /// Replaces the message a button belongs to, or sends a new one if there is none.
    async fn show(&self, user: UserId, message_id: Option<i64>, text: &str, keyboard: InlineKeyboardMarkup) {
        let result = match message_id {
            Some(id) => self.messenger.edit_text(user, id, text, Some(keyboard)).await,
            None => self.messenger.send_text(user, text, Some(keyboard.into())).await,
        };
        if let Err(e) = result {
            warn!("🤖️ Could not show a screen to user #{user}. {e}");
        }
    }
}
