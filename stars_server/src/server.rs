use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use stars_engine::{assets::AssetStore, events::EventHandlers, SqliteDatabase};
use telegram_tools::TelegramApi;

use crate::{
    config::ServerConfig,
    dispatcher::Dispatcher,
    errors::ServerError,
    messenger::{Messenger, TelegramMessenger},
    notifications::{admin_notification_hooks, AdminNotifier},
    routes::{health, WebhookRoute, WebhookSecret},
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let assets = AssetStore::new(&config.assets_dir);
    assets.ensure_dir().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let api = TelegramApi::new(config.telegram.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if let Some(url) = &config.webhook_url {
        let secret = config.webhook_secret.as_ref().map(|s| s.reveal().as_str());
        match api.set_webhook(url, secret).await {
            Ok(_) => info!("💻️ Webhook registered at {url}"),
            Err(e) => error!("💻️ Could not register the webhook at {url}. {e}"),
        }
    }
    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(api));

    let notifier = AdminNotifier::new(db.clone(), Arc::clone(&messenger), config.bot.admin_ids.clone());
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, admin_notification_hooks(notifier));
    let producers = handlers.producers();
    handlers.start_handlers();

    let dispatcher = Dispatcher::new(db, assets, producers, messenger, config.bot.clone());
    let count = dispatcher.catalog().reload().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ Catalog loaded with {count} products");

    let srv = create_server_instance(config, dispatcher)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    dispatcher: Dispatcher<SqliteDatabase>,
) -> Result<Server, ServerError> {
    // One dispatcher for all workers, so that every worker sees the same sessions and catalog
    let dispatcher = web::Data::new(dispatcher);
    let secret = web::Data::new(WebhookSecret(config.webhook_secret.clone()));
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("stars::access_log"))
            .app_data(dispatcher.clone())
            .app_data(secret.clone())
            .service(health)
            .service(WebhookRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
