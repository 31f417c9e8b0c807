//! Classification of raw bot API updates into the events the dispatcher understands.
use std::fmt::Display;

use log::*;
use stars_engine::db_types::UserId;
use telegram_tools::data_objects::{Message, Update};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Shop,
    /// `/grant <user id> <amount>`. The arguments are validated by the handler.
    Grant(String),
    /// `/revoke <user id> <amount>`.
    Revoke(String),
    Stats,
    Help,
    Unknown(String),
}

impl Command {
    /// Parses a slash command. Returns `None` if `text` is not a command at all.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        // Commands in group chats can be addressed as /start@shop_bot
        let name = name.split('@').next().unwrap_or(name);
        let args = args.trim().to_string();
        let command = match name {
            "start" => Self::Start,
            "shop" => Self::Shop,
            "grant" | "givestars" => Self::Grant(args),
            "revoke" | "starsdelete" => Self::Revoke(args),
            "stats" => Self::Stats,
            "help" => Self::Help,
            other => Self::Unknown(other.to_string()),
        };
        Some(command)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start => write!(f, "/start"),
            Command::Shop => write!(f, "/shop"),
            Command::Grant(_) => write!(f, "/grant"),
            Command::Revoke(_) => write!(f, "/revoke"),
            Command::Stats => write!(f, "/stats"),
            Command::Help => write!(f, "/help"),
            Command::Unknown(name) => write!(f, "/{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command { user: UserId, command: Command },
    Text { user: UserId, text: String },
    Upload { user: UserId, file_handle: String, file_name: String },
    Button { user: UserId, username: Option<String>, callback_id: String, message_id: Option<i64>, payload: String },
    PreCheckout { user: UserId, query_id: String, payload: String },
    /// `amount` is the total the provider charged. `username` is the payer's chat handle, if they have one.
    PaymentConfirmed { user: UserId, username: Option<String>, payload: String, amount: i64 },
}

impl InboundEvent {
    pub fn user(&self) -> UserId {
        match self {
            InboundEvent::Command { user, .. } |
            InboundEvent::Text { user, .. } |
            InboundEvent::Upload { user, .. } |
            InboundEvent::Button { user, .. } |
            InboundEvent::PreCheckout { user, .. } |
            InboundEvent::PaymentConfirmed { user, .. } => *user,
        }
    }
}

/// Picks the one thing in the update the shop cares about. Updates that carry nothing actionable (edits, stickers,
/// channel posts) yield `None`.
pub fn classify(update: Update) -> Option<InboundEvent> {
    if let Some(query) = update.pre_checkout_query {
        return Some(InboundEvent::PreCheckout {
            user: UserId(query.from.id),
            query_id: query.id,
            payload: query.invoice_payload,
        });
    }
    if let Some(query) = update.callback_query {
        return Some(InboundEvent::Button {
            user: UserId(query.from.id),
            username: query.from.username,
            callback_id: query.id,
            message_id: query.message.map(|m| m.message_id),
            payload: query.data.unwrap_or_default(),
        });
    }
    let message = match update.message {
        Some(m) => m,
        None => {
            trace!("🤖️ Update {} has nothing to handle", update.update_id);
            return None;
        },
    };
    classify_message(message)
}

fn classify_message(message: Message) -> Option<InboundEvent> {
    let user = UserId(message.from.as_ref().map(|u| u.id).unwrap_or(message.chat.id));
    if let Some(payment) = message.successful_payment {
        return Some(InboundEvent::PaymentConfirmed {
            user,
            username: message.from.and_then(|u| u.username),
            payload: payment.invoice_payload,
            amount: payment.total_amount,
        });
    }
    if let Some(document) = message.document {
        let file_name = document.file_name.unwrap_or_else(|| "file".to_string());
        return Some(InboundEvent::Upload { user, file_handle: document.file_id, file_name });
    }
    let text = message.text?;
    match Command::parse(&text) {
        Some(command) => Some(InboundEvent::Command { user, command }),
        None => Some(InboundEvent::Text { user, text }),
    }
}
