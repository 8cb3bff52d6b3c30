use async_trait::async_trait;
use serde::Serialize;

use crate::shape::Shape;
use crate::types::{ItemId, ItemInfo};

/// Failure reported by a [`Store`].
///
/// The dispatcher does not distinguish the variants on read; both surface as
/// a 404 to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("item {id} not found")]
    NotFound { id: ItemId },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Storage collaborator for one resource kind.
/// Implementations: in-memory (`crudmux_server::storage::MemoryStore`), external backends.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Shape new items decode into.
    type Item: Shape;

    /// Unique resource name. The store is served under `/<name>`.
    fn name(&self) -> &str;

    /// Persist a new item and return its envelope.
    async fn add(&self, item: Self::Item) -> Result<ItemInfo, StoreError>;

    /// Load an item and its envelope by identifier.
    async fn get(&self, id: &ItemId) -> Result<(Self::Item, ItemInfo), StoreError>;
}

/// Custom operation exposed as a single `POST` endpoint.
///
/// `process` takes one request value and yields a response value or a
/// failure. Any failure is reported to the caller as a client error.
#[async_trait]
pub trait Oper: Send + Sync + 'static {
    /// Declared request shape.
    type Request: Shape;
    /// Response value, JSON-encoded on success.
    type Response: Serialize + Send;

    async fn process(&self, request: Self::Request) -> anyhow::Result<Self::Response>;
}
