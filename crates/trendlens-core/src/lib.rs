pub mod app_config;
pub mod categories;
pub mod config;
pub mod insights;
pub mod popularity;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use categories::CategoryKey;
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_CHUNK_SIZE};
pub use insights::{category_stats, sort_products, CategoryStats, SortKey};
pub use popularity::{popularity_score, Popularity};
pub use products::{Product, ProductRecord, VariantTag};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown variant tag: {0}")]
    UnknownVariantTag(String),
    #[error("unknown sort key: {0}")]
    UnknownSortKey(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
