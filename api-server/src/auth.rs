// api-server/src/auth.rs
use actix_web::HttpRequest;
use common::models::user::UserIdentity;
use common::Config;
use serde_json::{Map, Value};
use thiserror::Error;
use url::form_urlencoded;

/// Synthetic identity handed out for accepted dev-bypass requests
const DEV_USER_ID: i64 = 1;

/// Upper bound on the serialized size of a user's `user_data` object
const MAX_USER_DATA_BYTES: usize = 10_000;

/// Why a request's authentication was rejected. Display strings double
/// as the response error messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("No authentication data provided")]
    Missing,
    #[error("Invalid authentication data")]
    Invalid,
    #[error("Invalid user data")]
    InvalidUser,
}

/// Extract the `user` field from an init-data query string.
///
/// Cryptographic validation of the host's signature over the init data is
/// an opaque trust boundary: this scaffold extracts the identity without
/// verifying the hash. A hardened deployment slots verification in here.
pub fn extract_identity(init_data: &str) -> Result<UserIdentity, AuthRejection> {
    let user_json = form_urlencoded::parse(init_data.as_bytes())
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.into_owned())
        .ok_or(AuthRejection::Invalid)?;

    let identity: UserIdentity =
        serde_json::from_str(&user_json).map_err(|_| AuthRejection::InvalidUser)?;

    if identity.id <= 0 {
        return Err(AuthRejection::InvalidUser);
    }
    Ok(identity)
}

/// Authenticate a data request.
///
/// Host init data is checked first. The dev bypass is honored only when
/// the server itself has opted in; the client cannot prove it runs
/// outside production, so the opt-in lives here.
pub fn authenticate(req: &HttpRequest, config: &Config) -> Result<UserIdentity, AuthRejection> {
    if let Some(init_data) = header_value(req, &config.auth.identity_header) {
        return extract_identity(init_data);
    }

    if config.server.accept_dev_auth {
        if let Some(token) = header_value(req, &config.auth.dev_auth_header) {
            if token == config.auth.dev_auth_token {
                return Ok(UserIdentity {
                    id: DEV_USER_ID,
                    first_name: "Dev".to_string(),
                    last_name: String::new(),
                    username: "dev".to_string(),
                    language_code: "en".to_string(),
                });
            }
            tracing::warn!("Dev-bypass header present with wrong token");
            return Err(AuthRejection::Invalid);
        }
    }

    Err(AuthRejection::Missing)
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)?
        .to_str()
        .ok()
        .filter(|value| !value.is_empty())
}

/// Validate an update payload before it reaches the store
pub fn validate_update(data: &Value) -> Result<&Map<String, Value>, String> {
    let map = data.as_object().ok_or_else(|| "Data must be an object".to_string())?;
    if map.is_empty() {
        return Err("No data provided".to_string());
    }

    if let Some(first_name) = map.get("first_name") {
        let usable = first_name.as_str().map(|s| !s.trim().is_empty()).unwrap_or(false);
        if !usable {
            return Err("First name cannot be empty".to_string());
        }
    }

    if let Some(user_data) = map.get("user_data") {
        if !user_data.is_object() {
            return Err("user_data must be an object".to_string());
        }
        let serialized = serde_json::to_string(user_data)
            .map_err(|_| "user_data contains invalid JSON data".to_string())?;
        if serialized.len() > MAX_USER_DATA_BYTES {
            return Err("user_data is too large (max 10KB)".to_string());
        }
    }

    Ok(map)
}
