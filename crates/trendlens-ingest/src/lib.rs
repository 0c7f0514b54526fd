//! Ingestion side of the catalog: turns scraped feed exports and admin
//! uploads into clean, canonical [`trendlens_core::Product`] batches.

pub mod admin;
pub mod clean;
pub mod error;
pub mod ids;
pub mod normalize;
pub mod parse;
pub mod types;

pub use admin::{parse_upload, Upload, UploadFormat};
pub use clean::{clean_products, dedup_key, ProductCleaner, Rejection, DEFAULT_EXCLUDED_KEYWORDS};
pub use error::IngestError;
pub use ids::{generate_fallback_id, is_fallback_id};
pub use normalize::{normalize_feed, normalize_item};
pub use parse::{parse_price, parse_rating, parse_review_count};
pub use types::{RawFeedItem, RawValue};
