//! Storage abstraction for chats and messages.
//!
//! The [`ChatStore`] trait defines every storage operation the gateway
//! needs, enabling pluggable backends (SQLite for deployments, in-memory
//! for tests and keyless trial runs).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Chat, Message};

/// Aggregate counters reported by the admin stats endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreStats {
    pub chats: u64,
    pub messages: u64,
}

/// Abstract storage backend for the relay.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create_chat`](ChatStore::create_chat) | Insert a new chat thread |
/// | [`get_chat`](ChatStore::get_chat) | Look up a chat by id |
/// | [`list_chats`](ChatStore::list_chats) | All chats, newest first |
/// | [`delete_chat`](ChatStore::delete_chat) | Remove a chat and all its messages |
/// | [`append_message`](ChatStore::append_message) | Persist one message |
/// | [`list_messages`](ChatStore::list_messages) | A chat's messages, oldest first |
/// | [`clear`](ChatStore::clear) | Drop every chat and message |
/// | [`stats`](ChatStore::stats) | Row counts for the admin API |
///
/// Messages are owned exclusively by their chat: `delete_chat` cascades and
/// no message survives its parent.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_chat(&self, chat: &Chat) -> Result<()>;

    async fn get_chat(&self, id: &str) -> Result<Option<Chat>>;

    /// All chats ordered by creation time, newest first.
    async fn list_chats(&self) -> Result<Vec<Chat>>;

    /// Deletes a chat and its messages. Returns `false` when no chat with
    /// that id existed.
    async fn delete_chat(&self, id: &str) -> Result<bool>;

    async fn append_message(&self, message: &Message) -> Result<()>;

    /// A chat's messages ordered by creation time, oldest first.
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    async fn clear(&self) -> Result<()>;

    async fn stats(&self) -> Result<StoreStats>;
}
