// api-server/src/bot.rs
use std::sync::Arc;

use async_trait::async_trait;
use common::models::user::UserIdentity;
use dashmap::DashMap;
use serde_json::{json, Value};
use thiserror::Error;

use crate::store::UserStore;

/// Failures raised by Bot API calls
#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot api transport failure: {0}")]
    Transport(String),
    #[error("bot api rejected the call: {0}")]
    Api(String),
}

/// Seam over the chat platform's Bot API so the handler can be driven
/// by a scripted client in tests.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Send a message to a chat; returns the platform-assigned message id
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<Value>,
    ) -> Result<i64, BotError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError>;
}

/// Production Bot API client backed by reqwest
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(api_base: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        }
    }

    async fn call(&self, method: &str, payload: Value) -> Result<Value, BotError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;

        if body["ok"].as_bool() != Some(true) {
            let description = body["description"].as_str().unwrap_or("unknown error");
            return Err(BotError::Api(description.to_string()));
        }
        Ok(body["result"].clone())
    }
}

#[async_trait]
impl BotApi for TelegramApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<Value>,
    ) -> Result<i64, BotError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            payload["reply_markup"] = markup;
        }

        let result = self.call("sendMessage", payload).await?;
        result["message_id"]
            .as_i64()
            .ok_or_else(|| BotError::Api("response carried no message_id".to_string()))
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError> {
        self.call(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await?;
        Ok(())
    }
}

/// Structural check that a payload looks like a webhook update
pub fn is_update(payload: &Value) -> bool {
    let Some(map) = payload.as_object() else {
        return false;
    };
    ["update_id", "message", "callback_query", "edited_message", "channel_post"]
        .iter()
        .any(|key| map.contains_key(*key))
}

/// One chat interaction distilled from a webhook update
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub chat_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub text: Option<String>,
    pub callback_data: Option<String>,
    pub has_media: bool,
}

impl ChatEvent {
    /// Parse a webhook update into a chat event. Updates without an
    /// identifiable user and chat are not actionable.
    pub fn parse(update: &Value) -> Option<Self> {
        if let Some(query) = update.get("callback_query") {
            let mut event = Self::from_message(query.get("message")?, query.get("from"))?;
            event.callback_data = query
                .get("data")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Some(event);
        }

        let message = update.get("message").or_else(|| update.get("edited_message"))?;
        Self::from_message(message, None)
    }

    fn from_message(message: &Value, from_override: Option<&Value>) -> Option<Self> {
        let from = from_override.or_else(|| message.get("from"))?;
        let str_field = |value: &Value, key: &str| {
            value.get(key).and_then(Value::as_str).unwrap_or("").to_string()
        };

        Some(Self {
            chat_id: message.get("chat")?.get("id")?.as_i64()?,
            message_id: message.get("message_id")?.as_i64()?,
            user_id: from.get("id")?.as_i64()?,
            first_name: str_field(from, "first_name"),
            last_name: str_field(from, "last_name"),
            username: str_field(from, "username"),
            text: message.get("text").and_then(Value::as_str).map(str::to_string),
            callback_data: None,
            has_media: ["photo", "video", "voice", "document"]
                .iter()
                .any(|key| message.get(*key).is_some()),
        })
    }

    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if !name.is_empty() {
            name.to_string()
        } else if !self.username.is_empty() {
            self.username.clone()
        } else {
            "Unknown".to_string()
        }
    }

    fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            language_code: "en".to_string(),
        }
    }
}

/// Routes webhook updates through the dialog script. One bot reply is
/// tracked per chat so each new reply replaces the previous one.
pub struct BotHandler {
    api: Arc<dyn BotApi>,
    front_url: String,
    last_reply: DashMap<i64, i64>,
}

impl BotHandler {
    pub fn new(api: Arc<dyn BotApi>, front_url: String) -> Self {
        Self { api, front_url, last_reply: DashMap::new() }
    }

    /// Process one update. Returns false when the update is not actionable
    /// or the reply could not be delivered.
    pub async fn handle_update(&self, update: &Value, store: &UserStore) -> bool {
        let Some(event) = ChatEvent::parse(update) else {
            tracing::debug!("webhook update carried no actionable chat event");
            return false;
        };

        if let Some(data) = event.callback_data.clone() {
            return self.handle_callback(&event, &data).await;
        }
        if let Some(text) = event.text.clone() {
            return self.handle_text(&event, text.trim(), store).await;
        }

        // Media and other unscripted message kinds are cleared from the chat
        self.discard(&event).await
    }

    async fn handle_text(&self, event: &ChatEvent, text: &str, store: &UserStore) -> bool {
        if let Some(command) = text.strip_prefix('/') {
            return self.handle_command(event, command, store).await;
        }

        match text.to_lowercase().as_str() {
            "hi" | "hello" | "hey" => {
                let reply = format!(
                    "Hello {}!\n\nUse /start to see available options.",
                    event.full_name()
                );
                self.send_clean(event.chat_id, &reply, None).await
            }
            "help" => self.handle_start(event, store).await,
            "thanks" | "thank you" => {
                self.send_clean(event.chat_id, "You're welcome!", None).await
            }
            _ => self.discard(event).await,
        }
    }

    async fn handle_command(&self, event: &ChatEvent, command: &str, store: &UserStore) -> bool {
        match command.to_lowercase().as_str() {
            "start" | "help" => self.handle_start(event, store).await,
            other => {
                let reply = format!(
                    "Unknown command: /{other}\n\nAvailable commands:\n/start - Main menu\n/help - Show help"
                );
                self.send_clean(event.chat_id, &reply, None).await
            }
        }
    }

    /// The start command registers the user and answers with a keyboard
    /// that opens the mini-app.
    async fn handle_start(&self, event: &ChatEvent, store: &UserStore) -> bool {
        let (user, created) = store.get_or_create(&event.identity());
        if created {
            tracing::info!(user_id = user.id, "created user from bot start command");
        }

        // A restart begins a fresh exchange; stop tracking the previous reply
        self.last_reply.remove(&event.chat_id);

        let welcome = format!(
            "Hello, <b>{}</b>!\n\nWelcome! Open the app with the button below.",
            event.full_name()
        );
        let keyboard = json!({
            "inline_keyboard": [
                [{ "text": "Open app", "web_app": { "url": self.front_url } }]
            ]
        });
        self.send_clean(event.chat_id, &welcome, Some(keyboard)).await
    }

    async fn handle_callback(&self, event: &ChatEvent, data: &str) -> bool {
        let reply = format!("Unknown action: {data}");
        self.send_clean(event.chat_id, &reply, None).await
    }

    /// Delete the previous tracked reply, then send and track a new one
    async fn send_clean(&self, chat_id: i64, text: &str, reply_markup: Option<Value>) -> bool {
        if let Some((_, previous)) = self.last_reply.remove(&chat_id) {
            if let Err(e) = self.api.delete_message(chat_id, previous).await {
                tracing::debug!(chat_id, error = %e, "failed to delete previous reply");
            }
        }

        match self.api.send_message(chat_id, text, reply_markup).await {
            Ok(message_id) => {
                self.last_reply.insert(chat_id, message_id);
                true
            }
            Err(e) => {
                tracing::error!(chat_id, error = %e, "failed to send reply");
                false
            }
        }
    }

    /// Remove a message the dialog script has no answer for
    async fn discard(&self, event: &ChatEvent) -> bool {
        if let Err(e) = self.api.delete_message(event.chat_id, event.message_id).await {
            tracing::debug!(chat_id = event.chat_id, error = %e, "failed to delete unhandled message");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_plain_messages() {
        let update = json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "chat": { "id": 77 },
                "from": { "id": 42, "first_name": "Ada", "last_name": "L", "username": "ada" },
                "text": "/start"
            }
        });

        let event = ChatEvent::parse(&update).unwrap();
        assert_eq!(event.chat_id, 77);
        assert_eq!(event.message_id, 5);
        assert_eq!(event.user_id, 42);
        assert_eq!(event.text.as_deref(), Some("/start"));
        assert_eq!(event.full_name(), "Ada L");
        assert!(!event.has_media);
    }

    #[test]
    fn parse_attributes_callbacks_to_the_presser() {
        let update = json!({
            "update_id": 11,
            "callback_query": {
                "id": "q1",
                "from": { "id": 9, "username": "presser" },
                "data": "settings",
                "message": {
                    "message_id": 3,
                    "chat": { "id": 77 },
                    "from": { "id": 1, "username": "the_bot" }
                }
            }
        });

        let event = ChatEvent::parse(&update).unwrap();
        assert_eq!(event.user_id, 9);
        assert_eq!(event.callback_data.as_deref(), Some("settings"));
        assert_eq!(event.full_name(), "presser");
    }

    #[test]
    fn parse_rejects_updates_without_a_sender() {
        let update = json!({
            "update_id": 12,
            "message": { "message_id": 1, "chat": { "id": 2 }, "text": "hi" }
        });
        assert!(ChatEvent::parse(&update).is_none());
    }

    #[test]
    fn parse_flags_media_messages() {
        let update = json!({
            "update_id": 13,
            "message": {
                "message_id": 8,
                "chat": { "id": 2 },
                "from": { "id": 3 },
                "photo": [{ "file_id": "abc" }]
            }
        });
        let event = ChatEvent::parse(&update).unwrap();
        assert!(event.has_media);
        assert!(event.text.is_none());
    }

    #[test]
    fn is_update_requires_update_shaped_payloads() {
        assert!(is_update(&json!({ "update_id": 1 })));
        assert!(is_update(&json!({ "message": {} })));
        assert!(!is_update(&json!({ "foo": 1 })));
        assert!(!is_update(&json!([1, 2, 3])));
    }
}
