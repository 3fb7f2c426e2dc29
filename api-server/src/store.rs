// api-server/src/store.rs
use common::models::user::{User, UserIdentity};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use serde_json::{Map, Value};

/// In-memory user store keyed by platform user id, with an id index for
/// enumeration. Shared across workers behind `web::Data`.
#[derive(Default)]
pub struct UserStore {
    users: DashMap<i64, User>,
    index: DashSet<i64>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.users.get(&id).map(|entry| entry.clone())
    }

    pub fn exists(&self, id: i64) -> bool {
        self.users.contains_key(&id)
    }

    /// Return the existing record for this identity, or create one.
    /// The boolean reports whether a record was created.
    pub fn get_or_create(&self, identity: &UserIdentity) -> (User, bool) {
        match self.users.entry(identity.id) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let user = User::new(
                    identity.id,
                    &identity.first_name,
                    &identity.last_name,
                    &identity.username,
                    &identity.language_code,
                );
                entry.insert(user.clone());
                self.index.insert(identity.id);
                tracing::info!(user_id = identity.id, "created new user");
                (user, true)
            }
        }
    }

    /// Merge recognized fields into an existing record. Unknown fields are
    /// ignored; `user_data` replaces the stored object wholesale.
    pub fn update(&self, id: i64, updates: &Map<String, Value>) -> Option<User> {
        let mut entry = self.users.get_mut(&id)?;
        let user = entry.value_mut();

        for (key, value) in updates {
            match key.as_str() {
                "first_name" => {
                    if let Some(v) = value.as_str() {
                        user.first_name = v.to_string();
                    }
                }
                "last_name" => {
                    if let Some(v) = value.as_str() {
                        user.last_name = v.to_string();
                    }
                }
                "username" => {
                    if let Some(v) = value.as_str() {
                        user.username = v.to_string();
                    }
                }
                "language_code" => {
                    if let Some(v) = value.as_str() {
                        user.language_code = v.to_string();
                    }
                }
                "user_data" => user.user_data = value.clone(),
                _ => tracing::debug!(field = %key, "ignoring unrecognized update field"),
            }
        }

        user.mark_updated();
        tracing::info!(user_id = id, "updated user");
        Some(user.clone())
    }

    pub fn delete(&self, id: i64) -> bool {
        self.index.remove(&id);
        let removed = self.users.remove(&id).is_some();
        if removed {
            tracing::info!(user_id = id, "deleted user");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
