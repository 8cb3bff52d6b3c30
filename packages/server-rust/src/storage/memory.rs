//! In-memory [`Store`] backed by [`DashMap`].
//!
//! Concurrent reads and writes need no external locking. Items live for the
//! lifetime of the process; nothing is persisted.

use async_trait::async_trait;
use chrono::Utc;
use crudmux_core::{ItemId, ItemInfo, Shape, Store, StoreError, UserId};
use dashmap::DashMap;
use uuid::Uuid;

/// Revision assigned to newly created items.
pub const INITIAL_REVISION: u64 = 1;

/// Owner recorded on items when no user is configured.
pub const DEFAULT_USER: &str = "anonymous";

/// A stored item together with its envelope.
#[derive(Debug, Clone)]
struct Entry<T> {
    item: T,
    info: ItemInfo,
}

/// In-memory store keyed by UUID v4 identifiers.
pub struct MemoryStore<T> {
    name: String,
    user_id: UserId,
    entries: DashMap<ItemId, Entry<T>>,
}

impl<T> MemoryStore<T> {
    /// Creates an empty store served under `/<name>`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: UserId::from(DEFAULT_USER),
            entries: DashMap::new(),
        }
    }

    /// Records `user_id` as the owner of every item created from now on.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl<T: Shape + Clone> Store for MemoryStore<T> {
    type Item = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, item: T) -> Result<ItemInfo, StoreError> {
        let info = ItemInfo {
            id: ItemId(Uuid::new_v4().to_string()),
            user_id: self.user_id.clone(),
            rev: INITIAL_REVISION,
            timestamp: Utc::now(),
        };
        self.entries.insert(
            info.id.clone(),
            Entry {
                item,
                info: info.clone(),
            },
        );
        Ok(info)
    }

    async fn get(&self, id: &ItemId) -> Result<(T, ItemInfo), StoreError> {
        self.entries
            .get(id)
            .map(|entry| (entry.item.clone(), entry.info.clone()))
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_get_round_trip() {
        let store = MemoryStore::<serde_json::Value>::new("things");
        assert!(store.is_empty());

        let item = serde_json::json!({"a": 1});
        let info = store.add(item.clone()).await.unwrap();
        assert_eq!(info.rev, INITIAL_REVISION);
        assert_eq!(info.user_id.as_str(), DEFAULT_USER);
        assert_eq!(store.len(), 1);

        let (fetched, fetched_info) = store.get(&info.id).await.unwrap();
        assert_eq!(fetched, item);
        assert_eq!(fetched_info, info);
    }

    #[tokio::test]
    async fn ids_are_unique_per_add() {
        let store = MemoryStore::<serde_json::Value>::new("things");
        let a = store.add(serde_json::Value::Null).await.unwrap();
        let b = store.add(serde_json::Value::Null).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let store = MemoryStore::<serde_json::Value>::new("things");
        let err = store.get(&ItemId::from("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id } if id.as_str() == "nope"));
    }

    #[tokio::test]
    async fn configured_user_owns_new_items() {
        let store = MemoryStore::<serde_json::Value>::new("things").with_user("u-42");
        let info = store.add(serde_json::Value::Null).await.unwrap();
        assert_eq!(info.user_id, UserId::from("u-42"));
    }
}
