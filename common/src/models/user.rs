// common/src/models/user.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User record shared between the API server and the shell client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Platform-assigned user identifier
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub language_code: String,
    /// Free-form per-user application data
    #[serde(default = "empty_object")]
    pub user_data: Value,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl User {
    /// Create a new user record with empty application data
    pub fn new(id: i64, first_name: &str, last_name: &str, username: &str, language_code: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            username: username.to_string(),
            language_code: language_code.to_string(),
            user_data: empty_object(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Touch the update timestamp
    pub fn mark_updated(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Identity fields carried inside host init data (the `user` field of the
/// init-data query string) or synthesized for the dev bypass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub language_code: String,
}

/// Data endpoints answer either `{ "user": {...} }` or the bare user object;
/// callers must accept both shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserPayload {
    Wrapped { user: User },
    Bare(User),
}

impl UserPayload {
    pub fn into_user(self) -> User {
        match self {
            UserPayload::Wrapped { user } => user,
            UserPayload::Bare(user) => user,
        }
    }
}
