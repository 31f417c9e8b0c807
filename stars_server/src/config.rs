use std::env;

use log::*;
use stars_common::{helpers::split_list, Secret};
use stars_engine::db_types::UserId;
use telegram_tools::TelegramConfig;

const DEFAULT_STARS_HOST: &str = "127.0.0.1";
const DEFAULT_STARS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/stars_shop.db";
const DEFAULT_ASSETS_DIR: &str = "products_files";
const DEFAULT_SUPPORT_USERNAME: &str = "@support";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The flat directory product files are stored in.
    pub assets_dir: String,
    /// If set, webhook calls must carry this value in the `X-Telegram-Bot-Api-Secret-Token` header.
    pub webhook_secret: Option<Secret<String>>,
    /// If set, the webhook is registered with the bot API at this URL on start-up.
    pub webhook_url: Option<String>,
    pub bot: BotConfig,
    pub telegram: TelegramConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_STARS_HOST.to_string(),
            port: DEFAULT_STARS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            webhook_secret: None,
            webhook_url: None,
            bot: BotConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("STARS_HOST").ok().unwrap_or_else(|| DEFAULT_STARS_HOST.into());
        let port = env::var("STARS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for STARS_PORT. {e} Using the default, {DEFAULT_STARS_PORT}, \
                         instead."
                    );
                    DEFAULT_STARS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_STARS_PORT);
        let database_url = env::var("STARS_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ STARS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let assets_dir = env::var("STARS_ASSETS_DIR").ok().unwrap_or_else(|| DEFAULT_ASSETS_DIR.to_string());
        let webhook_secret = env::var("STARS_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()).map(Secret::new);
        if webhook_secret.is_none() {
            warn!("🪛️ STARS_WEBHOOK_SECRET is not set. Webhook calls will not be authenticated.");
        }
        let webhook_url = env::var("STARS_WEBHOOK_URL").ok().filter(|s| !s.is_empty());
        let bot = BotConfig::from_env_or_default();
        let telegram = TelegramConfig::new_from_env_or_default();
        Self { host, port, database_url, assets_dir, webhook_secret, webhook_url, bot, telegram }
    }
}

/// Who runs the shop and how users reach them.
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub admin_ids: Vec<UserId>,
    /// The support contact, including the leading `@`.
    pub support_username: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self { admin_ids: Vec::new(), support_username: DEFAULT_SUPPORT_USERNAME.to_string() }
    }
}

impl BotConfig {
    pub fn new<S: Into<String>>(admin_ids: Vec<UserId>, support_username: S) -> Self {
        Self { admin_ids, support_username: support_username.into() }
    }

    pub fn from_env_or_default() -> Self {
        let admin_ids = env::var("STARS_ADMIN_IDS").map(|s| parse_admin_ids(&s)).unwrap_or_default();
        if admin_ids.is_empty() {
            warn!("🪛️ STARS_ADMIN_IDS is not set. Nobody will be able to manage the shop.");
        }
        let support_username = env::var("STARS_SUPPORT_USERNAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| if s.starts_with('@') { s } else { format!("@{s}") })
            .unwrap_or_else(|| DEFAULT_SUPPORT_USERNAME.to_string());
        Self { admin_ids, support_username }
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_ids.contains(&user)
    }

    /// A link that opens a chat with the support contact.
    pub fn support_url(&self) -> String {
        format!("https://t.me/{}", self.support_username.trim_start_matches('@'))
    }
}

/// Parses a comma separated list of user ids. Invalid entries are logged and skipped.
pub fn parse_admin_ids(value: &str) -> Vec<UserId> {
    split_list(value)
        .into_iter()
        .filter_map(|s| {
            s.parse::<UserId>()
                .map_err(|e| {
                    warn!("🪛️ Ignoring invalid admin id ({s}) in STARS_ADMIN_IDS: {e}");
                })
                .ok()
        })
        .collect()
}
