//! In-memory [`ChatStore`] implementation for tests and keyless trial runs.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety. Insertion order
//! doubles as creation order, so listing needs no secondary sort key when
//! timestamps collide.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chat, Message};

use super::{ChatStore, StoreStats};

/// Process-local store. Contents are lost on restart.
pub struct InMemoryStore {
    chats: RwLock<Vec<Chat>>,
    messages: RwLock<Vec<Message>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            chats: RwLock::new(Vec::new()),
            messages: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn create_chat(&self, chat: &Chat) -> Result<()> {
        let mut chats = self.chats.write().unwrap();
        if chats.iter().any(|c| c.id == chat.id) {
            anyhow::bail!("chat already exists: {}", chat.id);
        }
        chats.push(chat.clone());
        Ok(())
    }

    async fn get_chat(&self, id: &str) -> Result<Option<Chat>> {
        let chats = self.chats.read().unwrap();
        Ok(chats.iter().find(|c| c.id == id).cloned())
    }

    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let chats = self.chats.read().unwrap();
        let mut out: Vec<Chat> = chats.clone();
        // Stable sort: ties keep insertion order, newest first overall.
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn delete_chat(&self, id: &str) -> Result<bool> {
        let mut chats = self.chats.write().unwrap();
        let before = chats.len();
        chats.retain(|c| c.id != id);
        let existed = chats.len() != before;
        if existed {
            self.messages.write().unwrap().retain(|m| m.chat_id != id);
        }
        Ok(existed)
    }

    async fn append_message(&self, message: &Message) -> Result<()> {
        self.messages.write().unwrap().push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let messages = self.messages.read().unwrap();
        Ok(messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.chats.write().unwrap().clear();
        self.messages.write().unwrap().clear();
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            chats: self.chats.read().unwrap().len() as u64,
            messages: self.messages.read().unwrap().len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::{Duration, Utc};

    fn chat(id: &str) -> Chat {
        Chat {
            id: id.to_string(),
            name: format!("chat {}", id),
            created_at: Utc::now(),
            user_id: None,
        }
    }

    fn message(id: &str, chat_id: &str, role: Role) -> Message {
        Message {
            id: id.to_string(),
            chat_id: chat_id.to_string(),
            role,
            content: format!("content {}", id),
            model: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_get_chat() {
        let store = InMemoryStore::new();
        store.create_chat(&chat("a")).await.unwrap();
        assert_eq!(store.get_chat("a").await.unwrap().unwrap().id, "a");
        assert!(store.get_chat("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_chat_id_rejected() {
        let store = InMemoryStore::new();
        store.create_chat(&chat("a")).await.unwrap();
        assert!(store.create_chat(&chat("a")).await.is_err());
    }

    #[tokio::test]
    async fn chats_listed_newest_first() {
        let store = InMemoryStore::new();
        let mut old = chat("old");
        old.created_at = Utc::now() - Duration::hours(1);
        store.create_chat(&old).await.unwrap();
        store.create_chat(&chat("new")).await.unwrap();

        let listed = store.list_chats().await.unwrap();
        assert_eq!(listed[0].id, "new");
        assert_eq!(listed[1].id, "old");
    }

    #[tokio::test]
    async fn delete_cascades_messages() {
        let store = InMemoryStore::new();
        store.create_chat(&chat("a")).await.unwrap();
        store.create_chat(&chat("b")).await.unwrap();
        for i in 0..4 {
            store
                .append_message(&message(&format!("m{}", i), "a", Role::User))
                .await
                .unwrap();
        }
        store
            .append_message(&message("other", "b", Role::User))
            .await
            .unwrap();

        assert!(store.delete_chat("a").await.unwrap());
        assert!(store.list_messages("a").await.unwrap().is_empty());
        // Unrelated chat untouched.
        assert_eq!(store.list_messages("b").await.unwrap().len(), 1);
        assert!(!store.delete_chat("a").await.unwrap());
    }

    #[tokio::test]
    async fn messages_listed_oldest_first_and_reads_are_stable() {
        let store = InMemoryStore::new();
        store.create_chat(&chat("a")).await.unwrap();
        store
            .append_message(&message("m1", "a", Role::User))
            .await
            .unwrap();
        store
            .append_message(&message("m2", "a", Role::Assistant))
            .await
            .unwrap();

        let first = store.list_messages("a").await.unwrap();
        assert_eq!(first[0].id, "m1");
        assert_eq!(first[1].id, "m2");

        let second = store.list_messages("a").await.unwrap();
        let ids: Vec<_> = second.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec!["m1".to_string(), "m2".to_string()]);
    }

    #[tokio::test]
    async fn clear_and_stats() {
        let store = InMemoryStore::new();
        store.create_chat(&chat("a")).await.unwrap();
        store
            .append_message(&message("m1", "a", Role::User))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.chats, 1);
        assert_eq!(stats.messages, 1);

        store.clear().await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.chats, 0);
        assert_eq!(stats.messages, 0);
    }
}
