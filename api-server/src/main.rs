// api-server/src/main.rs
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use api_server::bot::{BotHandler, TelegramApi};
use api_server::{api, static_files, store::UserStore};
use common::{setup_tracing, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load configuration
    let config = Config::from_env();

    // Save what the server closure needs before moving config into web::Data
    let server_addr = config.server.addr.clone();
    let static_config = config.server.static_files.clone();

    tracing::info!("Starting API server on {}", server_addr);
    if config.server.accept_dev_auth {
        tracing::warn!("Dev-bypass authentication is accepted; never enable this in production");
    }
    if config.bot.token.is_empty() {
        tracing::warn!("No bot token configured; webhook updates will be refused");
    }

    // Create data references
    let bot_api = Arc::new(TelegramApi::new(&config.bot.api_base, &config.bot.token));
    let bot_data = web::Data::new(BotHandler::new(bot_api, config.bot.front_url.clone()));
    let config_data = web::Data::new(config);
    let store_data = web::Data::new(UserStore::new());

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(store_data.clone())
            .app_data(bot_data.clone())
            .service(web::scope("/api").configure(api::configure))
            .configure(|cfg| static_files::configure(cfg, &static_config))
    })
    .bind(&server_addr)?
    .run()
    .await
}
