use std::sync::Arc;

use stars_engine::{
    assets::AssetStore,
    db_types::UserId,
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path, tear_down},
    SqliteDatabase,
};
use tempfile::TempDir;

use super::mocks::RecordingMessenger;
use crate::{
    config::BotConfig,
    dispatcher::Dispatcher,
    inbound::{Command, InboundEvent},
    messenger::Messenger,
};

pub const ADMIN: UserId = UserId(1000);
pub const ALICE: UserId = UserId(2001);
pub const BOB: UserId = UserId(2002);

/// A dispatcher wired to a fresh database, a temporary asset directory and a recording messenger.
pub struct TestShop {
    pub db: SqliteDatabase,
    pub dispatcher: Dispatcher<SqliteDatabase>,
    pub messenger: Arc<RecordingMessenger>,
    pub assets_dir: TempDir,
}

impl TestShop {
    pub async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let assets_dir = tempfile::tempdir().expect("Could not create asset directory");
        let assets = AssetStore::new(assets_dir.path().join("products_files"));
        let messenger = Arc::new(RecordingMessenger::default());
        let config = BotConfig::new(vec![ADMIN], "@shop_support");
        let dispatcher = Dispatcher::new(
            db.clone(),
            assets,
            EventProducers::default(),
            Arc::clone(&messenger) as Arc<dyn Messenger>,
            config,
        );
        Self { db, dispatcher, messenger, assets_dir }
    }

    pub async fn command(&self, user: UserId, text: &str) {
        let command = Command::parse(text).expect("Not a command");
        self.dispatcher.dispatch(InboundEvent::Command { user, command }).await;
    }

    pub async fn text(&self, user: UserId, text: &str) {
        self.dispatcher.dispatch(InboundEvent::Text { user, text: text.to_string() }).await;
    }

    pub async fn button(&self, user: UserId, payload: &str) {
        let event = InboundEvent::Button {
            user,
            username: None,
            callback_id: format!("cb-{payload}"),
            message_id: Some(500),
            payload: payload.to_string(),
        };
        self.dispatcher.dispatch(event).await;
    }

    pub async fn upload(&self, user: UserId, handle: &str, file_name: &str, contents: &[u8]) {
        self.messenger.add_file(handle, contents);
        let event =
            InboundEvent::Upload { user, file_handle: handle.to_string(), file_name: file_name.to_string() };
        self.dispatcher.dispatch(event).await;
    }

    pub async fn balance(&self, user: UserId) -> i64 {
        self.dispatcher.ledger().balance(user).await.expect("Could not read balance").value()
    }

    /// Runs the whole add-product flow as the admin and returns the new product's id.
    pub async fn add_product(&self, name: &str, price: i64, handle: &str, contents: &[u8]) -> i64 {
        self.button(ADMIN, "add-product").await;
        self.text(ADMIN, name).await;
        self.text(ADMIN, &price.to_string()).await;
        self.text(ADMIN, &format!("{name} description")).await;
        self.upload(ADMIN, handle, &format!("{name}.zip"), contents).await;
        self.messenger.take();
        self.dispatcher
            .catalog()
            .products()
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.id.0)
            .expect("Product was not added")
    }

    pub async fn tear_down(self) {
        drop(self.dispatcher);
        tear_down(self.db).await;
    }
}
