use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("JSON syntax error: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("upload must be a JSON array of products, found {found}")]
    NotAnArray { found: &'static str },

    #[error("record {index} is not a valid {format} entry: {source}")]
    InvalidRecord {
        index: usize,
        format: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
