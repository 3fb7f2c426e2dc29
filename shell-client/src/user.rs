// shell-client/src/user.rs
use std::sync::Arc;

use common::models::user::{User, UserPayload};
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::NetworkError;
use crate::net::NetworkClient;

/// Data calls the loaded views issue against the backend user endpoints.
/// Responses are accepted as either `{ "user": {...} }` or the bare user
/// object.
pub struct UserApi {
    net: Arc<NetworkClient>,
    api_base: String,
}

impl UserApi {
    pub fn new(net: Arc<NetworkClient>, api_base: &str) -> Self {
        Self { net, api_base: api_base.trim_end_matches('/').to_string() }
    }

    /// Get or create the current user's record
    pub async fn get_user(&self) -> Result<User, NetworkError> {
        let url = format!("{}/user/get_data", self.api_base);
        let value = self.net.call(&url, Method::POST, Some(&json!({})), &[]).await?;
        parse_user(value)
    }

    /// Merge the given fields into the current user's record
    pub async fn update_user(&self, updates: &Value) -> Result<User, NetworkError> {
        let url = format!("{}/user/up_data", self.api_base);
        let value = self.net.call(&url, Method::POST, Some(updates), &[]).await?;
        parse_user(value)
    }
}

fn parse_user(value: Value) -> Result<User, NetworkError> {
    let payload: UserPayload = serde_json::from_value(value)?;
    Ok(payload.into_user())
}
