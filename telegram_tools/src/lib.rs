mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::TelegramApi;
pub use config::TelegramConfig;
pub use error::TelegramApiError;
