use std::sync::Arc;

use log::*;
use reqwest::{multipart, Client};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use stars_common::STARS_CURRENCY_CODE;

use crate::{
    config::TelegramConfig,
    data_objects::{
        AnswerPreCheckoutQuery,
        ApiResponse,
        EditMessageText,
        File,
        InlineKeyboardMarkup,
        LabeledPrice,
        Message,
        MessageOrTrue,
        ReplyMarkup,
        SendInvoice,
        SendMessage,
    },
    TelegramApiError,
};

#[derive(Clone)]
pub struct TelegramApi {
    config: TelegramConfig,
    client: Arc<Client>,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramApiError> {
        let client = Client::builder().build().map_err(|e| TelegramApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// The URL of a bot API method.
    pub fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_url, self.config.bot_token.reveal())
    }

    /// The download URL of a file previously resolved with [`Self::get_file`].
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.config.api_url, self.config.bot_token.reveal())
    }

    /// Calls a bot API method with a JSON body and unwraps the result envelope.
    pub async fn call<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T, TelegramApiError> {
        trace!("Calling bot API method {method}");
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramApiError::RequestError(e.without_url().to_string()))?;
        self.unwrap_response(method, response).await
    }

    async fn unwrap_response<T: DeserializeOwned>(
        &self,
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, TelegramApiError> {
        let status = i64::from(response.status().as_u16());
        let envelope = response
            .json::<ApiResponse<T>>()
            .await
            .map_err(|e| TelegramApiError::JsonError(e.without_url().to_string()))?;
        if !envelope.ok {
            return Err(TelegramApiError::QueryError {
                method: method.to_string(),
                status: envelope.error_code.unwrap_or(status),
                message: envelope.description.unwrap_or_default(),
            });
        }
        trace!("Bot API method {method} succeeded");
        envelope.result.ok_or_else(|| TelegramApiError::EmptyResponse(method.to_string()))
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<Message, TelegramApiError> {
        let body = SendMessage { chat_id, text: text.to_string(), reply_markup };
        self.call("sendMessage", &body).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageOrTrue, TelegramApiError> {
        let body = EditMessageText { chat_id, message_id, text: text.to_string(), reply_markup };
        self.call("editMessageText", &body).await
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<bool, TelegramApiError> {
        let mut body = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call("answerCallbackQuery", &body).await
    }

    /// Uploads a file as a document.
    pub async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        contents: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<Message, TelegramApiError> {
        let part = multipart::Part::bytes(contents).file_name(file_name.to_string());
        let mut form = multipart::Form::new().text("chat_id", chat_id.to_string()).part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        debug!("Uploading {file_name} to chat {chat_id}");
        let response = self
            .client
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TelegramApiError::RequestError(e.without_url().to_string()))?;
        self.unwrap_response("sendDocument", response).await
    }

    /// Sends an invoice payable in stars.
    pub async fn send_invoice(
        &self,
        chat_id: i64,
        title: &str,
        description: &str,
        payload: &str,
        amount: i64,
    ) -> Result<Message, TelegramApiError> {
        let body = SendInvoice {
            chat_id,
            title: title.to_string(),
            description: description.to_string(),
            payload: payload.to_string(),
            provider_token: String::default(),
            currency: STARS_CURRENCY_CODE.to_string(),
            prices: vec![LabeledPrice { label: title.to_string(), amount }],
        };
        self.call("sendInvoice", &body).await
    }

    pub async fn answer_pre_checkout_query(
        &self,
        pre_checkout_query_id: &str,
        ok: bool,
        error_message: Option<String>,
    ) -> Result<bool, TelegramApiError> {
        let body =
            AnswerPreCheckoutQuery { pre_checkout_query_id: pre_checkout_query_id.to_string(), ok, error_message };
        self.call("answerPreCheckoutQuery", &body).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramApiError> {
        self.call("getFile", &json!({ "file_id": file_id })).await
    }

    /// Resolves and downloads an uploaded file.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TelegramApiError> {
        let file = self.get_file(file_id).await?;
        let path = file.file_path.ok_or_else(|| TelegramApiError::EmptyResponse(format!("getFile({file_id})")))?;
        let response = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(|e| TelegramApiError::RequestError(e.without_url().to_string()))?;
        if !response.status().is_success() {
            return Err(TelegramApiError::QueryError {
                method: "download".to_string(),
                status: i64::from(response.status().as_u16()),
                message: format!("Could not download {path}"),
            });
        }
        let bytes = response.bytes().await.map_err(|e| TelegramApiError::ResponseError(e.without_url().to_string()))?;
        debug!("Downloaded {} bytes for file {file_id}", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Points the bot's updates at `url`. The secret, if given, is echoed back in every webhook call.
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<bool, TelegramApiError> {
        let mut body = json!({ "url": url });
        if let Some(secret) = secret_token {
            body["secret_token"] = json!(secret);
        }
        info!("Registering webhook at {url}");
        self.call("setWebhook", &body).await
    }
}
