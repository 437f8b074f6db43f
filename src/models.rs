//! Core data models shared across the relay.
//!
//! These types represent the chats, messages, and provider settings that flow
//! through the gateway and the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message within a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parses a wire-format role string. Only `user` and `assistant` are
    /// accepted; anything else is rejected at the gateway boundary.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of conversation as sent to a provider. Ephemeral: built per
/// request from the incoming payload, never stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A named conversation thread. Owns its messages exclusively: deleting a
/// chat deletes every message that references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<String>,
}

/// A persisted message row. Written once per turn side (user input, then
/// assistant reply) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub content: String,
    /// The model that produced the content. `None` for user messages.
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}
