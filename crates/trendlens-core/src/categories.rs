use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The fixed set of dashboard categories. Each key owns an independent,
/// ordered product list in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryKey {
    Knitwear,
    TopsBlouses,
    Dresses,
    Vacation,
    TrendsNow,
    Favorites,
}

impl CategoryKey {
    pub const ALL: [CategoryKey; 6] = [
        CategoryKey::Knitwear,
        CategoryKey::TopsBlouses,
        CategoryKey::Dresses,
        CategoryKey::Vacation,
        CategoryKey::TrendsNow,
        CategoryKey::Favorites,
    ];

    /// Storage key, identical to the serialized form (e.g. `"topsBlouses"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKey::Knitwear => "knitwear",
            CategoryKey::TopsBlouses => "topsBlouses",
            CategoryKey::Dresses => "dresses",
            CategoryKey::Vacation => "vacation",
            CategoryKey::TrendsNow => "trendsNow",
            CategoryKey::Favorites => "favorites",
        }
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryKey {
    type Err = CoreError;

    /// Accepts the storage key in any letter case, with or without `-`/`_`
    /// separators, so `tops-blouses` and `topsBlouses` are equivalent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        CategoryKey::ALL
            .into_iter()
            .find(|key| key.as_str().to_lowercase() == folded)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}
