// api-server/src/api/mod.rs
pub mod users;
pub mod webhook;

use actix_web::http::Method;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(users::health)
        .service(
            web::resource("/user/get_data")
                .route(web::post().to(users::get_user_data))
                .route(web::route().method(Method::OPTIONS).to(users::user_preflight)),
        )
        .service(
            web::resource("/user/up_data")
                .route(web::post().to(users::update_user_data))
                .route(web::route().method(Method::OPTIONS).to(users::user_preflight)),
        )
        .service(web::resource("/webhook").route(web::post().to(webhook::webhook)));
}
