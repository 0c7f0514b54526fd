//! In-process [`CatalogStorage`] backend with optional JSON snapshot
//! persistence.
//!
//! Every write is staged on a copy of the document tree, flushed to the
//! snapshot file (temp file plus rename) and only then swapped in, so a
//! failed flush leaves both the file and the in-memory state untouched.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use trendlens_core::{CategoryKey, Product};

use crate::error::StoreError;
use crate::port::{
    chunk_doc_id, CatalogStorage, ChangeEvent, ChangeReceiver, ChunkWrite, StoredChunk,
};

/// Buffered notifications per watch before a slow receiver lags.
const WATCH_CAPACITY: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CategoryDocuments {
    #[serde(default)]
    chunks: BTreeMap<String, Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    legacy: Option<Vec<Product>>,
}

type Documents = BTreeMap<CategoryKey, CategoryDocuments>;

#[derive(Debug)]
pub struct MemoryStorage {
    documents: RwLock<Documents>,
    watchers: HashMap<(CategoryKey, ChangeEvent), broadcast::Sender<ChangeEvent>>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_documents(Documents::new(), None)
    }
}

impl MemoryStorage {
    /// A volatile store with nothing persisted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store backed by the snapshot at `path`. A missing file starts
    /// an empty store; the file is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SnapshotIo`] when the file exists but cannot be
    /// read, and [`StoreError::SnapshotFormat`] when it is not a valid
    /// snapshot.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let documents = read_snapshot(&path).await?;
        tracing::info!(
            path = %path.display(),
            categories = documents.len(),
            "opened catalog snapshot"
        );
        Ok(Self::with_documents(documents, Some(path)))
    }

    /// Re-reads the snapshot file, picking up writes made by other processes,
    /// and notifies the watchers of every document set that changed.
    /// Returns the categories that changed. A volatile store returns none.
    ///
    /// # Errors
    ///
    /// Same as [`MemoryStorage::open`].
    pub async fn reload_snapshot(&self) -> Result<Vec<CategoryKey>, StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(Vec::new());
        };
        let fresh = read_snapshot(path).await?;

        let mut documents = self.documents.write().await;
        let empty = CategoryDocuments::default();
        let mut events = Vec::new();
        for category in CategoryKey::ALL {
            let before = documents.get(&category).unwrap_or(&empty);
            let after = fresh.get(&category).unwrap_or(&empty);
            if before.chunks != after.chunks {
                events.push((category, ChangeEvent::Chunks));
            }
            if before.legacy != after.legacy {
                events.push((category, ChangeEvent::Legacy));
            }
        }
        *documents = fresh;
        drop(documents);

        let mut changed: Vec<CategoryKey> = Vec::new();
        for (category, event) in events {
            self.notify(category, event);
            if changed.last() != Some(&category) {
                changed.push(category);
            }
        }
        if !changed.is_empty() {
            tracing::debug!(changed = changed.len(), "reloaded catalog snapshot");
        }
        Ok(changed)
    }

    fn with_documents(documents: Documents, snapshot_path: Option<PathBuf>) -> Self {
        let watchers = CategoryKey::ALL
            .iter()
            .flat_map(|&category| {
                [ChangeEvent::Chunks, ChangeEvent::Legacy]
                    .map(|event| ((category, event), broadcast::channel(WATCH_CAPACITY).0))
            })
            .collect();

        Self {
            documents: RwLock::new(documents),
            watchers,
            snapshot_path,
        }
    }

    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Stores `products` as the legacy single document of `category`.
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot cannot be written.
    pub async fn put_legacy(
        &self,
        category: CategoryKey,
        products: Vec<Product>,
    ) -> Result<(), StoreError> {
        self.mutate(category, |docs| docs.legacy = Some(products)).await?;
        self.notify(category, ChangeEvent::Legacy);
        Ok(())
    }

    /// Stores a chunk document under an arbitrary doc id.
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot cannot be written.
    pub async fn put_chunk_document(
        &self,
        category: CategoryKey,
        doc_id: impl Into<String>,
        products: Vec<Product>,
    ) -> Result<(), StoreError> {
        let doc_id = doc_id.into();
        self.mutate(category, |docs| {
            docs.chunks.insert(doc_id, products);
        })
        .await?;
        self.notify(category, ChangeEvent::Chunks);
        Ok(())
    }

    /// Open watches on `category`, chunk and legacy combined.
    #[must_use]
    pub fn watcher_count(&self, category: CategoryKey) -> usize {
        [ChangeEvent::Chunks, ChangeEvent::Legacy]
            .iter()
            .filter_map(|event| self.watchers.get(&(category, *event)))
            .map(broadcast::Sender::receiver_count)
            .sum()
    }

    /// Applies `apply` to a staged copy, persists it, then swaps it in.
    async fn mutate<F>(&self, category: CategoryKey, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut CategoryDocuments),
    {
        let mut documents = self.documents.write().await;
        let mut staged = documents.clone();
        apply(staged.entry(category).or_default());
        self.persist(&staged).await?;
        *documents = staged;
        Ok(())
    }

    async fn persist(&self, documents: &Documents) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let bytes =
            serde_json::to_vec_pretty(documents).map_err(|source| StoreError::SnapshotFormat {
                path: path.display().to_string(),
                source,
            })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(snapshot_io(path))?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(snapshot_io(&tmp))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(snapshot_io(path))?;
        Ok(())
    }

    fn notify(&self, category: CategoryKey, event: ChangeEvent) {
        if let Some(sender) = self.watchers.get(&(category, event)) {
            // Err only means nobody is watching.
            let _ = sender.send(event);
        }
    }

    fn watch(
        &self,
        category: CategoryKey,
        event: ChangeEvent,
    ) -> Result<ChangeReceiver, StoreError> {
        self.watchers
            .get(&(category, event))
            .map(broadcast::Sender::subscribe)
            .ok_or_else(|| StoreError::Backend(format!("no watch channel for {category}")))
    }
}

async fn read_snapshot(path: &Path) -> Result<Documents, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::SnapshotFormat {
            path: path.display().to_string(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Documents::new()),
        Err(source) => Err(StoreError::SnapshotIo {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn snapshot_io(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::SnapshotIo {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait::async_trait]
impl CatalogStorage for MemoryStorage {
    async fn list_chunks(&self, category: CategoryKey) -> Result<Vec<StoredChunk>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&category)
            .map(|docs| {
                docs.chunks
                    .iter()
                    .map(|(doc_id, products)| StoredChunk {
                        doc_id: doc_id.clone(),
                        products: products.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn write_chunks(
        &self,
        category: CategoryKey,
        batch: ChunkWrite,
    ) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut chunks_changed = !batch.upserts.is_empty();
        let mut legacy_removed = false;
        let upserted = batch.upserts.len();
        let deleted = batch.deletes.len();

        self.mutate(category, |docs| {
            for index in &batch.deletes {
                chunks_changed |= docs.chunks.remove(&chunk_doc_id(*index)).is_some();
            }
            for (index, products) in batch.upserts {
                docs.chunks.insert(chunk_doc_id(index), products);
            }
            if batch.delete_legacy {
                legacy_removed = docs.legacy.take().is_some();
            }
        })
        .await?;

        tracing::debug!(
            %category,
            upserted,
            deleted,
            legacy_removed,
            "applied chunk write"
        );

        if chunks_changed {
            self.notify(category, ChangeEvent::Chunks);
        }
        if legacy_removed {
            self.notify(category, ChangeEvent::Legacy);
        }
        Ok(())
    }

    async fn read_legacy(
        &self,
        category: CategoryKey,
    ) -> Result<Option<Vec<Product>>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.get(&category).and_then(|docs| docs.legacy.clone()))
    }

    fn subscribe_chunks(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError> {
        self.watch(category, ChangeEvent::Chunks)
    }

    fn subscribe_legacy(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError> {
        self.watch(category, ChangeEvent::Legacy)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
