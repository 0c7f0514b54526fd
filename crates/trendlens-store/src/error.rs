use thiserror::Error;
use trendlens_core::CategoryKey;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("snapshot I/O error at {path}: {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot at {path} is not valid JSON: {source}")]
    SnapshotFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("category {category} would need {chunks} chunks, more than the index space allows")]
    ChunkOverflow { category: CategoryKey, chunks: usize },
}
