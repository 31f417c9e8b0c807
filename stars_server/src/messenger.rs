//! The outbound side of the chat transport.
//!
//! The dispatcher only ever talks to users through [`Messenger`], so that it can be driven without a network in
//! tests. [`TelegramMessenger`] is the production implementation on top of the bot API client.
use async_trait::async_trait;
use log::*;
use stars_engine::{db_types::UserId, shop_objects::DepositInvoice};
use telegram_tools::{
    data_objects::{InlineKeyboardMarkup, ReplyMarkup},
    TelegramApi,
};

use crate::errors::DeliveryError;

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat: UserId, text: &str, markup: Option<ReplyMarkup>) -> Result<(), DeliveryError>;

    /// Replaces the text (and inline keyboard) of a message the bot sent earlier.
    async fn edit_text(
        &self,
        chat: UserId,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError>;

    /// Stops the client's progress indicator on a pressed button.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), DeliveryError>;

    async fn send_document(
        &self,
        chat: UserId,
        file_name: &str,
        contents: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError>;

    async fn send_invoice(&self, chat: UserId, invoice: &DepositInvoice) -> Result<(), DeliveryError>;

    async fn answer_pre_checkout(&self, query_id: &str, ok: bool) -> Result<(), DeliveryError>;

    /// Fetches the contents of a file a user uploaded.
    async fn download_file(&self, file_handle: &str) -> Result<Vec<u8>, DeliveryError>;
}

#[derive(Clone)]
pub struct TelegramMessenger {
    api: TelegramApi,
}

impl TelegramMessenger {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat: UserId, text: &str, markup: Option<ReplyMarkup>) -> Result<(), DeliveryError> {
        self.api.send_message(chat.0, text, markup).await?;
        Ok(())
    }

    async fn edit_text(
        &self,
        chat: UserId,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError> {
        self.api.edit_message_text(chat.0, message_id, text, markup).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), DeliveryError> {
        self.api.answer_callback_query(callback_id, text).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat: UserId,
        file_name: &str,
        contents: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        self.api.send_document(chat.0, file_name, contents, caption).await?;
        Ok(())
    }

    async fn send_invoice(&self, chat: UserId, invoice: &DepositInvoice) -> Result<(), DeliveryError> {
        trace!("🤖️ Sending invoice {} to user #{chat}", invoice.payload);
        self.api
            .send_invoice(chat.0, &invoice.title, &invoice.description, &invoice.payload, invoice.amount.value())
            .await?;
        Ok(())
    }

    async fn answer_pre_checkout(&self, query_id: &str, ok: bool) -> Result<(), DeliveryError> {
        let error_message = (!ok).then(|| "This invoice can no longer be paid".to_string());
        self.api.answer_pre_checkout_query(query_id, ok, error_message).await?;
        Ok(())
    }

    async fn download_file(&self, file_handle: &str) -> Result<Vec<u8>, DeliveryError> {
        let contents = self.api.download_file(file_handle).await?;
        Ok(contents)
    }
}
