//! Persistence for category product lists.
//!
//! A category is stored as numbered chunks of at most `chunk_size` products,
//! with a read fallback to the pre-chunking single-document layout. The
//! [`ChunkedStore`] adapter owns that layout on top of any
//! [`CatalogStorage`] backend; [`Catalog`] adds the process-wide cache,
//! live subscriptions and favorites on top.

pub mod catalog;
pub mod chunked;
pub mod error;
pub mod memory;
pub mod port;
pub mod subscription;

pub use catalog::Catalog;
pub use chunked::{
    chunk_count, merge_partitions, parse_chunk_index, CategorySnapshot,
    ChunkedStore, SaveReport, SnapshotSource, StoreConfig,
};
pub use error::StoreError;
pub use memory::MemoryStorage;
pub use port::{
    chunk_doc_id, CatalogStorage, ChangeEvent, ChangeReceiver, ChunkIndex, ChunkWrite, StoredChunk,
};
pub use subscription::Subscription;
