use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::popularity::{popularity_score, Popularity};
use crate::CoreError;

/// Partition label used to merge uploads without discarding unrelated
/// products in the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantTag {
    Standard,
    Curvy,
}

impl std::fmt::Display for VariantTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantTag::Standard => write!(f, "standard"),
            VariantTag::Curvy => write!(f, "curvy"),
        }
    }
}

impl std::str::FromStr for VariantTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(VariantTag::Standard),
            "curvy" => Ok(VariantTag::Curvy),
            other => Err(CoreError::UnknownVariantTag(other.to_string())),
        }
    }
}

/// A catalog product in canonical form, as shown on the dashboard and
/// persisted in category chunks.
///
/// `popularity` is derived from `rating` and `review_count`; those three
/// fields are private so the derivation cannot drift. Use
/// [`Product::set_engagement`] to change the inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ProductRecord")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// `0` means the price was missing or unparseable.
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    rating: Decimal,
    review_count: u64,
    /// Review count exactly as the feed displayed it, e.g. `"1000+"`.
    pub review_count_display: String,
    popularity: Popularity,
    pub image: Option<String>,
    /// Primary image first (when present), then detail images in feed order.
    pub images: Vec<String>,
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_tag: Option<VariantTag>,
}

impl Product {
    /// Average rating in `[0, 5]`.
    #[must_use]
    pub fn rating(&self) -> Decimal {
        self.rating
    }

    #[must_use]
    pub fn review_count(&self) -> u64 {
        self.review_count
    }

    #[must_use]
    pub fn popularity(&self) -> Popularity {
        self.popularity
    }

    /// Replaces rating and review count and re-derives popularity.
    pub fn set_engagement(&mut self, rating: Decimal, review_count: u64) {
        self.rating = clamp_rating(rating);
        self.review_count = review_count;
        self.popularity = popularity_score(self.rating, review_count);
    }

    /// Returns the primary image URL when it is present and non-empty.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Loose, field-by-field form of a [`Product`].
///
/// This is what admin uploads and stored documents deserialize into. Every
/// field is optional on the wire; legacy snake_case spellings
/// (`original_price`, `reviews`) are accepted, and any incoming `popularity`
/// value is ignored because it is recomputed on conversion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default, alias = "original_price")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default, alias = "reviews", alias = "review_count")]
    pub review_count: u64,
    #[serde(default, alias = "review_count_display")]
    pub review_count_display: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "variant_tag")]
    pub variant_tag: Option<VariantTag>,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let rating = clamp_rating(record.rating);
        let review_count_display = record
            .review_count_display
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| record.review_count.to_string());

        Product {
            id: record.id,
            name: record.name,
            price: record.price.max(Decimal::ZERO),
            original_price: record.original_price,
            rating,
            review_count: record.review_count,
            review_count_display,
            popularity: popularity_score(rating, record.review_count),
            image: record.image,
            images: record.images,
            category: record.category,
            variant_tag: record.variant_tag,
        }
    }
}

fn clamp_rating(rating: Decimal) -> Decimal {
    rating.clamp(Decimal::ZERO, Decimal::from(5))
}
