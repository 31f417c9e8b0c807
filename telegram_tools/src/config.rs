use log::*;
use stars_common::Secret;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: Secret<String>,
}

impl TelegramConfig {
    pub fn new<S: Into<String>>(api_url: S, bot_token: Secret<String>) -> Self {
        Self { api_url: api_url.into(), bot_token }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("STARS_TELEGRAM_API_URL").unwrap_or_else(|_| {
            debug!("STARS_TELEGRAM_API_URL not set, using {DEFAULT_TELEGRAM_API_URL}");
            DEFAULT_TELEGRAM_API_URL.to_string()
        });
        let bot_token = Secret::new(std::env::var("STARS_BOT_TOKEN").unwrap_or_else(|_| {
            error!("STARS_BOT_TOKEN not set. No messages can be sent until it is configured.");
            String::default()
        }));
        Self { api_url, bot_token }
    }
}
