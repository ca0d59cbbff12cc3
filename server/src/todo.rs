//! Todo item and the request payloads that create or change one.
//!
//! # Design
//! The server owns `id`, `date` and the initial `is_done`, so the create
//! payload only carries a title. The update payload decodes missing fields to
//! their defaults: an empty title means "keep the current title" and a missing
//! `isDone` means `false`. A JSON `null` decodes the same way as a missing
//! field, and stored records missing a field load with its default.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::OsRng, TryRngCore};
use serde::{Deserialize, Deserializer, Serialize};

const ID_ALPHABET: &[u8; 64] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ID_LEN: usize = 21;

/// A single todo item, as stored on disk and returned by the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Todo {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_done: bool,
    /// Creation time in nanoseconds since the Unix epoch.
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
}

/// Body of `POST /todos`. Unknown fields such as `id` are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewTodo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

/// Body of `PATCH /todos/{id}`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_done: bool,
}

impl Todo {
    /// Applies a patch: `is_done` is always overwritten, `title` only when non-empty.
    pub fn apply(&mut self, patch: TodoPatch) {
        self.is_done = patch.is_done;
        if !patch.title.is_empty() {
            self.title = patch.title;
        }
    }
}

/// Decodes `null` as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Generates a short URL-safe random id, falling back to the current
/// timestamp when the OS random source is unavailable.
pub fn generate_id() -> String {
    let mut bytes = [0u8; ID_LEN];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => bytes
            .iter()
            .map(|b| char::from(ID_ALPHABET[usize::from(b & 63)]))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "random id generation failed, using timestamp");
            now_nanos()
        }
    }
}

/// Current time in nanoseconds since the Unix epoch, as a decimal string.
pub fn now_nanos() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        .to_string()
}
