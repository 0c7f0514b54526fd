//! The storage port the chunked adapter is written against.
//!
//! Backends store, per category, a set of chunk documents keyed by a string
//! doc id plus an optional pre-chunking legacy document. The port deals in
//! doc ids as the backend stores them; interpreting them as chunk indices is
//! the adapter's job.

use std::collections::BTreeMap;

use tokio::sync::broadcast;
use trendlens_core::{CategoryKey, Product};

use crate::error::StoreError;

/// Zero-based position of a chunk in its category.
pub type ChunkIndex = u32;

/// Notification receiver for one category's chunk set or legacy document.
/// Dropping it releases the watch.
pub type ChangeReceiver = broadcast::Receiver<ChangeEvent>;

/// Doc id under which a backend stores chunk `index`.
#[must_use]
pub fn chunk_doc_id(index: ChunkIndex) -> String {
    index.to_string()
}

/// Which document set changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Chunks,
    Legacy,
}

/// One chunk document as returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub doc_id: String,
    pub products: Vec<Product>,
}

/// A batch of chunk mutations for one category, applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkWrite {
    /// Chunks to create or overwrite.
    pub upserts: BTreeMap<ChunkIndex, Vec<Product>>,
    /// Chunks to delete. Missing chunks are ignored.
    pub deletes: Vec<ChunkIndex>,
    pub delete_legacy: bool,
}

impl ChunkWrite {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty() && !self.delete_legacy
    }
}

/// Document storage for category product lists.
#[async_trait::async_trait]
pub trait CatalogStorage: Send + Sync {
    /// Every chunk document stored for `category`, in backend order.
    async fn list_chunks(&self, category: CategoryKey) -> Result<Vec<StoredChunk>, StoreError>;

    /// Applies `batch` atomically: on error nothing is observably changed.
    async fn write_chunks(&self, category: CategoryKey, batch: ChunkWrite)
        -> Result<(), StoreError>;

    /// The legacy single-document list, if one is stored.
    async fn read_legacy(&self, category: CategoryKey)
        -> Result<Option<Vec<Product>>, StoreError>;

    /// Watches the chunk set of `category`.
    fn subscribe_chunks(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError>;

    /// Watches the legacy document of `category`.
    fn subscribe_legacy(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError>;
}
