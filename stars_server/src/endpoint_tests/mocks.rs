use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use stars_engine::{db_types::UserId, shop_objects::DepositInvoice};
use telegram_tools::data_objects::{InlineKeyboardMarkup, ReplyMarkup};

use crate::{errors::DeliveryError, messenger::Messenger};

/// Everything the bot said, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text { chat: UserId, text: String, markup: Option<ReplyMarkup> },
    Edit { chat: UserId, message_id: i64, text: String, markup: Option<InlineKeyboardMarkup> },
    CallbackAnswer { id: String },
    Document { chat: UserId, file_name: String, contents: Vec<u8> },
    Invoice { chat: UserId, payload: String, amount: i64 },
    PreCheckout { id: String, ok: bool },
}

impl Outgoing {
    /// The text of a message or edit.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outgoing::Text { text, .. } | Outgoing::Edit { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn chat(&self) -> Option<UserId> {
        match self {
            Outgoing::Text { chat, .. } |
            Outgoing::Edit { chat, .. } |
            Outgoing::Document { chat, .. } |
            Outgoing::Invoice { chat, .. } => Some(*chat),
            _ => None,
        }
    }
}

/// A messenger that records instead of sending. Uploads are served from `files`.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Outgoing>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail_documents: Mutex<bool>,
}

impl RecordingMessenger {
    pub fn add_file(&self, handle: &str, contents: &[u8]) {
        self.files.lock().insert(handle.to_string(), contents.to_vec());
    }

    pub fn fail_documents(&self) {
        *self.fail_documents.lock() = true;
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&self) -> Vec<Outgoing> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Returns and forgets everything recorded so far, apart from button acknowledgements.
    pub fn take_visible(&self) -> Vec<Outgoing> {
        self.take().into_iter().filter(|o| !matches!(o, Outgoing::CallbackAnswer { .. })).collect()
    }

    /// The texts of the recorded messages and edits.
    pub fn take_texts(&self) -> Vec<String> {
        self.take().iter().filter_map(|o| o.text().map(String::from)).collect()
    }

    fn record(&self, message: Outgoing) {
        self.sent.lock().push(message);
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat: UserId, text: &str, markup: Option<ReplyMarkup>) -> Result<(), DeliveryError> {
        self.record(Outgoing::Text { chat, text: text.to_string(), markup });
        Ok(())
    }

    async fn edit_text(
        &self,
        chat: UserId,
        message_id: i64,
        text: &str,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError> {
        self.record(Outgoing::Edit { chat, message_id, text: text.to_string(), markup });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<(), DeliveryError> {
        self.record(Outgoing::CallbackAnswer { id: callback_id.to_string() });
        Ok(())
    }

    async fn send_document(
        &self,
        chat: UserId,
        file_name: &str,
        contents: Vec<u8>,
        _caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        if *self.fail_documents.lock() {
            return Err(DeliveryError("upload refused".into()));
        }
        self.record(Outgoing::Document { chat, file_name: file_name.to_string(), contents });
        Ok(())
    }

    async fn send_invoice(&self, chat: UserId, invoice: &DepositInvoice) -> Result<(), DeliveryError> {
        self.record(Outgoing::Invoice { chat, payload: invoice.payload.clone(), amount: invoice.amount.value() });
        Ok(())
    }

    async fn answer_pre_checkout(&self, query_id: &str, ok: bool) -> Result<(), DeliveryError> {
        self.record(Outgoing::PreCheckout { id: query_id.to_string(), ok });
        Ok(())
    }

    async fn download_file(&self, file_handle: &str) -> Result<Vec<u8>, DeliveryError> {
        self.files.lock().get(file_handle).cloned().ok_or_else(|| DeliveryError(format!("no such file {file_handle}")))
    }
}
