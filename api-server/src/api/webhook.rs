// api-server/src/api/webhook.rs
use actix_web::{web, HttpResponse};
use common::Config;
use serde_json::{json, Value};

use crate::bot::{self, BotHandler};
use crate::store::UserStore;

/// Receive one bot update from the chat platform
pub async fn webhook(
    body: Option<web::Json<Value>>,
    config: web::Data<Config>,
    store: web::Data<UserStore>,
    bot: web::Data<BotHandler>,
) -> HttpResponse {
    if config.bot.token.is_empty() {
        tracing::error!("webhook called while no bot token is configured");
        return HttpResponse::InternalServerError()
            .json(json!({ "error": "Bot token not configured" }));
    }

    let update = match body {
        Some(json) => json.into_inner(),
        None => return HttpResponse::BadRequest().json(json!({ "error": "No update data" })),
    };
    if !bot::is_update(&update) {
        return HttpResponse::BadRequest().json(json!({ "error": "Invalid webhook request" }));
    }

    if bot.handle_update(&update, &store).await {
        HttpResponse::Ok().json(json!({ "status": "ok" }))
    } else {
        HttpResponse::InternalServerError().json(json!({ "error": "Failed to process update" }))
    }
}
