use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// JSON snapshot file backing the document store.
    pub store_path: PathBuf,
    /// Maximum products per persisted chunk. Always at least 1.
    pub chunk_size: usize,
    /// Lowercased keywords appended to the built-in exclusion list.
    pub extra_excluded_keywords: Vec<String>,
}
