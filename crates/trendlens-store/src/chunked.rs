//! Chunked persistence of category product lists.
//!
//! A category's list is split into consecutive chunks of at most
//! `chunk_size` products stored under their zero-based index. Reads
//! reassemble the chunks in numeric index order and fall back to the legacy
//! single document when no chunk exists. Saves merge against the stored list
//! by variant tag, re-chunk, prune stale tail chunks and drop the legacy
//! document in one atomic batch.
//!
//! Saves are read-modify-write without compare-and-swap: two concurrent
//! saves of the same category can both load before either writes, and the
//! later write then discards the earlier one's partition.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use trendlens_core::{AppConfig, CategoryKey, Product, DEFAULT_CHUNK_SIZE};
use trendlens_ingest::ProductCleaner;

use crate::error::StoreError;
use crate::port::{CatalogStorage, ChangeEvent, ChunkIndex, ChunkWrite};
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum products per chunk. Sized so a full chunk stays well under a
    /// 1 MB document limit.
    pub chunk_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
        }
    }
}

/// Where a reconstructed list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Chunks,
    Legacy,
    Empty,
}

/// A category's stored list before the read-path clean.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySnapshot {
    pub products: Vec<Product>,
    /// Indices of the chunks that were read, ascending. Empty unless
    /// `source` is [`SnapshotSource::Chunks`].
    pub chunk_indices: Vec<ChunkIndex>,
    pub source: SnapshotSource,
}

/// Outcome of a successful [`ChunkedStore::save_category`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    /// The cleaned list now stored for the category.
    pub products: Vec<Product>,
    pub chunks_written: usize,
    pub pruned: Vec<ChunkIndex>,
    /// The previous list was read from the legacy document.
    pub replaced_legacy: bool,
}

#[derive(Clone)]
pub struct ChunkedStore {
    storage: Arc<dyn CatalogStorage>,
    cleaner: Arc<ProductCleaner>,
    chunk_size: usize,
}

impl ChunkedStore {
    /// A `chunk_size` of zero is treated as one.
    #[must_use]
    pub fn new(
        storage: Arc<dyn CatalogStorage>,
        cleaner: ProductCleaner,
        config: StoreConfig,
    ) -> Self {
        Self {
            storage,
            cleaner: Arc::new(cleaner),
            chunk_size: config.chunk_size.max(1),
        }
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn cleaner(&self) -> &ProductCleaner {
        &self.cleaner
    }

    /// Reconstructs and re-cleans the stored list of `category`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn load_category(&self, category: CategoryKey) -> Result<Vec<Product>, StoreError> {
        let snapshot = self.load_raw(category).await?;
        let stored = snapshot.products.len();
        let products = self.cleaner.clean(snapshot.products);
        tracing::debug!(
            %category,
            source = ?snapshot.source,
            chunks = snapshot.chunk_indices.len(),
            stored,
            returned = products.len(),
            "loaded category"
        );
        Ok(products)
    }

    /// Reconstructs the stored list of `category` without cleaning it.
    ///
    /// Chunk doc ids that are not integers are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn load_raw(&self, category: CategoryKey) -> Result<CategorySnapshot, StoreError> {
        let mut indexed: Vec<(ChunkIndex, Vec<Product>)> = self
            .storage
            .list_chunks(category)
            .await?
            .into_iter()
            .filter_map(|chunk| match parse_chunk_index(&chunk.doc_id) {
                Some(index) => Some((index, chunk.products)),
                None => {
                    tracing::warn!(
                        %category,
                        doc_id = %chunk.doc_id,
                        "skipping chunk with non-numeric id"
                    );
                    None
                }
            })
            .collect();

        if indexed.is_empty() {
            let snapshot = match self.storage.read_legacy(category).await? {
                Some(products) => CategorySnapshot {
                    products,
                    chunk_indices: Vec::new(),
                    source: SnapshotSource::Legacy,
                },
                None => CategorySnapshot {
                    products: Vec::new(),
                    chunk_indices: Vec::new(),
                    source: SnapshotSource::Empty,
                },
            };
            return Ok(snapshot);
        }

        indexed.sort_by_key(|(index, _)| *index);
        let chunk_indices = indexed.iter().map(|(index, _)| *index).collect();
        let products = indexed.into_iter().flat_map(|(_, products)| products).collect();
        Ok(CategorySnapshot {
            products,
            chunk_indices,
            source: SnapshotSource::Chunks,
        })
    }

    /// Merges `incoming` into the stored list of `category` and persists the
    /// cleaned result.
    ///
    /// When the first incoming product carries a variant tag, only stored
    /// products with that tag are replaced; otherwise the whole list is.
    /// Chunks `0..n` are rewritten, stored chunks at index `n` and above are
    /// deleted along with the legacy document, all in one batch.
    ///
    /// # Errors
    ///
    /// Propagates storage failures. Nothing is persisted when an error is
    /// returned.
    pub async fn save_category(
        &self,
        category: CategoryKey,
        incoming: Vec<Product>,
    ) -> Result<SaveReport, StoreError> {
        let current = self.load_raw(category).await?;
        let received = incoming.len();
        let products = self.cleaner.clean(merge_partitions(incoming, current.products));

        let total = chunk_count(products.len(), self.chunk_size);
        let total_index = ChunkIndex::try_from(total).map_err(|_| StoreError::ChunkOverflow {
            category,
            chunks: total,
        })?;

        let upserts: BTreeMap<ChunkIndex, Vec<Product>> = (0..)
            .zip(products.chunks(self.chunk_size).map(<[Product]>::to_vec))
            .collect();
        let pruned: Vec<ChunkIndex> = current
            .chunk_indices
            .iter()
            .copied()
            .filter(|index| *index >= total_index)
            .collect();

        let batch = ChunkWrite {
            upserts,
            deletes: pruned.clone(),
            delete_legacy: true,
        };

        // The batch runs on its own task so a dropped caller cannot cancel it
        // halfway.
        let storage = Arc::clone(&self.storage);
        tokio::spawn(async move { storage.write_chunks(category, batch).await })
            .await
            .map_err(|e| StoreError::Backend(format!("chunk write task failed: {e}")))??;

        tracing::info!(
            %category,
            received,
            stored = products.len(),
            chunks = total,
            pruned = pruned.len(),
            "saved category"
        );

        Ok(SaveReport {
            products,
            chunks_written: total,
            pruned,
            replaced_legacy: current.source == SnapshotSource::Legacy,
        })
    }

    /// Watches `category` and calls `on_change` with the re-cleaned list once
    /// on start and again after every change to its chunks or legacy
    /// document.
    ///
    /// The watch runs on its own task until the returned [`Subscription`] is
    /// dropped or unsubscribed. A failed reload is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend refuses the watch.
    pub fn subscribe<F>(
        &self,
        category: CategoryKey,
        mut on_change: F,
    ) -> Result<Subscription, StoreError>
    where
        F: FnMut(Vec<Product>) + Send + 'static,
    {
        let mut chunks_rx = self.storage.subscribe_chunks(category)?;
        let mut legacy_rx = self.storage.subscribe_legacy(category)?;
        let store = self.clone();

        let task = tokio::spawn(async move {
            store.deliver(category, &mut on_change).await;

            let mut chunks_open = true;
            let mut legacy_open = true;
            loop {
                let reload = tokio::select! {
                    result = chunks_rx.recv(), if chunks_open => {
                        should_reload(result, &mut chunks_open, category, ChangeEvent::Chunks)
                    }
                    result = legacy_rx.recv(), if legacy_open => {
                        should_reload(result, &mut legacy_open, category, ChangeEvent::Legacy)
                    }
                    else => break,
                };
                if reload {
                    store.deliver(category, &mut on_change).await;
                }
            }
            tracing::debug!(%category, "category watch ended");
        });

        tracing::debug!(%category, "category watch started");
        Ok(Subscription::new(category, task))
    }

    async fn deliver<F>(&self, category: CategoryKey, on_change: &mut F)
    where
        F: FnMut(Vec<Product>) + Send,
    {
        match self.load_category(category).await {
            Ok(products) => on_change(products),
            Err(e) => tracing::warn!(%category, error = %e, "reload after change failed"),
        }
    }
}

fn should_reload(
    result: Result<ChangeEvent, RecvError>,
    open: &mut bool,
    category: CategoryKey,
    channel: ChangeEvent,
) -> bool {
    match result {
        Ok(_) => true,
        Err(RecvError::Lagged(skipped)) => {
            tracing::debug!(%category, ?channel, skipped, "watch lagged, reloading once");
            true
        }
        Err(RecvError::Closed) => {
            tracing::warn!(%category, ?channel, "watch channel closed");
            *open = false;
            false
        }
    }
}

/// Number of chunks needed for `total` products.
#[must_use]
pub fn chunk_count(total: usize, chunk_size: usize) -> usize {
    total.div_ceil(chunk_size.max(1))
}

/// Parses a chunk doc id as its integer index. Only plain decimal digits are
/// accepted.
#[must_use]
pub fn parse_chunk_index(doc_id: &str) -> Option<ChunkIndex> {
    if doc_id.is_empty() || !doc_id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    doc_id.parse().ok()
}

/// Combines an incoming batch with the currently stored list.
///
/// The variant tag of the first incoming product selects the partition being
/// replaced: stored products with a different tag (or none) are appended
/// after the incoming ones. An untagged or empty batch replaces everything.
#[must_use]
pub fn merge_partitions(incoming: Vec<Product>, current: Vec<Product>) -> Vec<Product> {
    let Some(tag) = incoming.first().and_then(|p| p.variant_tag) else {
        return incoming;
    };

    let mut merged = incoming;
    merged.extend(current.into_iter().filter(|p| p.variant_tag != Some(tag)));
    merged
}

#[cfg(test)]
#[path = "chunked_test.rs"]
mod tests;
