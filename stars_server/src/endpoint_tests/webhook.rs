use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use serde_json::json;
use stars_common::Secret;
use stars_engine::test_utils::prepare_env::tear_down;

use super::{
    helpers::{TestShop, ALICE},
    mocks::Outgoing,
};
use crate::routes::{WebhookRoute, WebhookSecret, SECRET_TOKEN_HEADER};

const SECRET: &str = "hook-secret";

fn start_update() -> serde_json::Value {
    json!({
        "update_id": 77,
        "message": {
            "message_id": 3,
            "from": { "id": ALICE.0, "first_name": "Alice" },
            "chat": { "id": ALICE.0, "type": "private" },
            "text": "/start"
        }
    })
}

/// Posts `body` to the webhook of a fresh shop and returns the status, the response body and what the bot sent.
async fn post_update(body: Vec<u8>, token: Option<&str>) -> (StatusCode, String, Vec<Outgoing>) {
    let _ = env_logger::try_init();
    let TestShop { db, dispatcher, messenger, assets_dir } = TestShop::new().await;
    let dispatcher = web::Data::new(dispatcher);
    let secret = web::Data::new(WebhookSecret(Some(Secret::new(SECRET.to_string()))));
    let app = test::init_service(
        App::new()
            .app_data(dispatcher.clone())
            .app_data(secret)
            .service(WebhookRoute::<stars_engine::SqliteDatabase>::new()),
    )
    .await;
    let mut req = TestRequest::post().uri("/webhook").set_payload(body);
    if let Some(token) = token {
        req = req.insert_header((SECRET_TOKEN_HEADER, token));
    }
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    let sent = messenger.take();
    drop(app);
    drop(dispatcher);
    drop(assets_dir);
    tear_down(db).await;
    (status, body, sent)
}

#[actix_web::test]
async fn missing_secret_is_forbidden() {
    let body = serde_json::to_vec(&start_update()).unwrap();
    let (status, body, sent) = post_update(body, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"The webhook secret is missing or incorrect"}"#);
    assert!(sent.is_empty());
}

#[actix_web::test]
async fn wrong_secret_is_forbidden() {
    let body = serde_json::to_vec(&start_update()).unwrap();
    let (status, _, sent) = post_update(body, Some("guess")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(sent.is_empty());
}

#[actix_web::test]
async fn updates_are_dispatched() {
    let body = serde_json::to_vec(&start_update()).unwrap();
    let (status, _, sent) = post_update(body, Some(SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat(), Some(ALICE));
    assert!(sent[0].text().unwrap().starts_with("👋 Welcome to the shop!"));
}

#[actix_web::test]
async fn unreadable_updates_are_acknowledged() {
    let (status, _, sent) = post_update(b"{not json".to_vec(), Some(SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sent.is_empty());
}
