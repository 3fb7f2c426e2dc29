// api-server/src/api/users.rs
use actix_web::{get, web, HttpRequest, HttpResponse};
use common::Config;
use serde_json::{json, Value};

use crate::auth::{self, AuthRejection};
use crate::store::UserStore;

/// OPTIONS preflight for the user endpoints
pub async fn user_preflight(req: HttpRequest, config: web::Data<Config>) -> HttpResponse {
    let allow_headers = format!(
        "Content-Type, {}, {}",
        config.auth.identity_header, config.auth.dev_auth_header
    );

    let mut response = HttpResponse::Ok();
    response
        .insert_header(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", allow_headers));

    // Credentialed cross-origin requests cannot use a wildcard, so the
    // caller's origin is echoed back.
    if let Some(origin) = req.headers().get("Origin").and_then(|v| v.to_str().ok()) {
        response
            .insert_header(("Access-Control-Allow-Origin", origin))
            .insert_header(("Access-Control-Allow-Credentials", "true"));
    }
    response.finish()
}

/// Get or create the calling user's record.
/// First contact creates the record and answers 201.
pub async fn get_user_data(
    req: HttpRequest,
    config: web::Data<Config>,
    store: web::Data<UserStore>,
) -> HttpResponse {
    let identity = match auth::authenticate(&req, &config) {
        Ok(identity) => identity,
        Err(rejection) => return unauthorized(rejection),
    };

    let (user, created) = store.get_or_create(&identity);
    if created {
        HttpResponse::Created().json(json!({ "user": user }))
    } else {
        tracing::debug!(user_id = user.id, "returning existing user");
        HttpResponse::Ok().json(json!({ "user": user }))
    }
}

/// Merge fields into the calling user's record
pub async fn update_user_data(
    req: HttpRequest,
    body: Option<web::Json<Value>>,
    config: web::Data<Config>,
    store: web::Data<UserStore>,
) -> HttpResponse {
    // Payload checks come before authentication, matching the endpoint's
    // long-standing behavior: malformed requests are 400, not 401.
    let updates = match body {
        Some(json) => json.into_inner(),
        None => return HttpResponse::BadRequest().json(json!({ "error": "No data provided" })),
    };
    let updates = match auth::validate_update(&updates) {
        Ok(map) => map.clone(),
        Err(message) => return HttpResponse::BadRequest().json(json!({ "error": message })),
    };

    let identity = match auth::authenticate(&req, &config) {
        Ok(identity) => identity,
        Err(rejection) => return unauthorized(rejection),
    };

    if !store.exists(identity.id) {
        return HttpResponse::NotFound().json(json!({ "error": "User not found" }));
    }

    match store.update(identity.id, &updates) {
        Some(user) => HttpResponse::Ok().json(json!({ "user": user })),
        None => HttpResponse::InternalServerError().json(json!({ "error": "Failed to update user" })),
    }
}

/// API health check
#[get("/health")]
pub async fn health(store: web::Data<UserStore>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "users": store.len(),
        "timestamp": chrono::Utc::now(),
    }))
}

fn unauthorized(rejection: AuthRejection) -> HttpResponse {
    tracing::warn!(error = %rejection, "rejecting unauthenticated data call");
    HttpResponse::Unauthorized().json(json!({ "error": rejection.to_string() }))
}
