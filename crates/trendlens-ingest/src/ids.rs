//! Fallback product identifiers.
//!
//! Feed rows without a usable id or product code get a generated id. The
//! cleaner must be able to tell those apart from real ids, because a
//! generated id is unique per normalization run and cannot be used to detect
//! duplicates; the product name is used instead.

use uuid::Uuid;

/// Prefix of every generated id.
pub const FALLBACK_ID_PREFIX: &str = "gen-";

/// Prefix of ids produced by the earlier random-number scheme, still present
/// in stored data.
const LEGACY_FALLBACK_PREFIX: &str = "0.";

/// Returns a fresh `gen-<uuid v4>` id.
#[must_use]
pub fn generate_fallback_id() -> String {
    format!("{FALLBACK_ID_PREFIX}{}", Uuid::new_v4())
}

/// `true` when `id` was generated rather than taken from the feed.
#[must_use]
pub fn is_fallback_id(id: &str) -> bool {
    id.starts_with(FALLBACK_ID_PREFIX) || id.starts_with(LEGACY_FALLBACK_PREFIX)
}
