// api-server/tests/webhook_test.rs
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::{test, web, App};
use api_server::api;
use api_server::bot::{BotApi, BotError, BotHandler};
use api_server::store::UserStore;
use async_trait::async_trait;
use common::Config;
use serde_json::{json, Value};

/// Bot API that records every send and delete and hands out
/// sequential message ids.
struct ScriptedBotApi {
    next_id: AtomicI64,
    sent: Mutex<Vec<(i64, String, Option<Value>)>>,
    deleted: Mutex<Vec<(i64, i64)>>,
}

impl ScriptedBotApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicI64::new(100),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl BotApi for ScriptedBotApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<Value>,
    ) -> Result<i64, BotError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push((chat_id, text.to_string(), reply_markup));
        Ok(id)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }
}

fn bot_config() -> Config {
    let mut config = Config::default();
    config.bot.token = "123:test".to_string();
    config
}

fn text_update(user_id: i64, message_id: i64, text: &str) -> Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": message_id,
            "chat": { "id": user_id },
            "from": { "id": user_id, "first_name": "Ada", "username": "ada" },
            "text": text
        }
    })
}

macro_rules! webhook_app {
    ($config:expr, $store:expr, $api:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($config))
                .app_data($store.clone())
                .app_data(web::Data::new(BotHandler::new(
                    $api,
                    "http://front.test".to_string(),
                )))
                .service(web::scope("/api").configure(api::configure)),
        )
        .await
    };
}

#[actix_web::test]
async fn start_command_registers_user_and_replies_with_app_button() {
    let api = ScriptedBotApi::new();
    let store = web::Data::new(UserStore::new());
    let app = webhook_app!(bot_config(), store, api.clone());

    let req = test::TestRequest::post()
        .uri("/api/webhook")
        .set_json(text_update(9, 1, "/start"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");

    assert!(store.exists(9));

    let sent = api.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (chat_id, text, markup) = &sent[0];
    assert_eq!(*chat_id, 9);
    assert!(text.contains("Ada"));
    let markup = markup.as_ref().unwrap();
    assert_eq!(
        markup["inline_keyboard"][0][0]["web_app"]["url"],
        "http://front.test"
    );
}

#[actix_web::test]
async fn webhook_requires_a_configured_token() {
    let api = ScriptedBotApi::new();
    let store = web::Data::new(UserStore::new());
    // Default config carries no token
    let app = webhook_app!(Config::default(), store, api.clone());

    let req = test::TestRequest::post()
        .uri("/api/webhook")
        .set_json(text_update(9, 1, "/start"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Bot token not configured");
    assert!(api.sent.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn non_update_payloads_are_rejected() {
    let api = ScriptedBotApi::new();
    let store = web::Data::new(UserStore::new());
    let app = webhook_app!(bot_config(), store, api.clone());

    let req = test::TestRequest::post()
        .uri("/api/webhook")
        .set_json(json!({ "foo": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid webhook request");
}

#[actix_web::test]
async fn unscripted_chatter_is_deleted() {
    let api = ScriptedBotApi::new();
    let store = web::Data::new(UserStore::new());
    let app = webhook_app!(bot_config(), store, api.clone());

    let req = test::TestRequest::post()
        .uri("/api/webhook")
        .set_json(text_update(5, 77, "what is this"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    assert!(api.sent.lock().unwrap().is_empty());
    assert_eq!(api.deleted.lock().unwrap().as_slice(), &[(5, 77)]);
}

#[actix_web::test]
async fn each_reply_replaces_the_previous_one() {
    let api = ScriptedBotApi::new();
    let store = web::Data::new(UserStore::new());
    let app = webhook_app!(bot_config(), store, api.clone());

    for message_id in 1..=2 {
        let req = test::TestRequest::post()
            .uri("/api/webhook")
            .set_json(text_update(5, message_id, "hi"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    // The second greeting deletes the first reply (id 100) before sending
    assert_eq!(api.sent.lock().unwrap().len(), 2);
    assert_eq!(api.deleted.lock().unwrap().as_slice(), &[(5, 100)]);
}
