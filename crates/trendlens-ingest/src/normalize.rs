//! Normalization from raw feed rows to [`trendlens_core::Product`].
//!
//! Number parsing is delegated to [`crate::parse`]; this module maps columns
//! onto the canonical shape. It does not validate or deduplicate, that is the
//! cleaner's job.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use trendlens_core::{Product, ProductRecord};

use crate::ids::generate_fallback_id;
use crate::parse::{meaningful, parse_price, parse_rating, parse_review_count};
use crate::types::{RawFeedItem, RawValue};

/// Feed column names.
pub mod columns {
    pub const ID: &str = "id";
    pub const PRODUCT_CODE: &str = "Product Code";
    pub const PRODUCT_NAME: &str = "Product Name";
    pub const SALE_PRICE: &str = "Sale Price";
    pub const RETAIL_PRICE: &str = "Retail Price";
    pub const COMMENT_COUNT: &str = "Comment Count";
    pub const AVERAGE_RATING: &str = "Average Rating";
    pub const MAIN_IMAGE: &str = "Main Image";
    pub const FIRST_DETAIL_IMAGE: &str = "Detail Image 1";
    pub const CATEGORY_NAME: &str = "Category Name";
}

/// Name given to rows without a product name. The cleaner rejects it.
pub const UNNAMED_PRODUCT: &str = "Sin nombre";

/// Category label for rows without a category column.
pub const DEFAULT_CATEGORY: &str = "General";

/// The free-tier exporter appends a row whose `id` is a notice like
/// `"Free Version is limited to 25 rows, upgrade to see the 95 other rows"`.
const QUOTA_NOTICE_PREFIX: &str = "Free Version is limited to";

static DETAIL_IMAGE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Detail Image \d+$").expect("valid regex"));

/// Normalizes a whole feed export.
///
/// Rows without an `id` column value, and the exporter's quota notice row,
/// are dropped before mapping. Order is preserved.
#[must_use]
pub fn normalize_feed(items: &[RawFeedItem]) -> Vec<Product> {
    let products: Vec<Product> = items
        .iter()
        .filter(|item| is_product_row(item))
        .map(normalize_item)
        .collect();

    tracing::debug!(
        rows = items.len(),
        products = products.len(),
        "normalized feed export"
    );
    products
}

fn is_product_row(item: &RawFeedItem) -> bool {
    item.text(columns::ID)
        .is_some_and(|id| !id.trim_start().starts_with(QUOTA_NOTICE_PREFIX))
}

/// Maps one feed row onto the canonical [`Product`] shape.
///
/// Missing ids fall back to the product code, then to a generated
/// `gen-` id. Missing names become [`UNNAMED_PRODUCT`].
#[must_use]
pub fn normalize_item(item: &RawFeedItem) -> Product {
    let id = item
        .text(columns::ID)
        .or_else(|| item.text(columns::PRODUCT_CODE))
        .map_or_else(generate_fallback_id, |s| s.trim().to_string());

    let name = item
        .text(columns::PRODUCT_NAME)
        .map_or_else(|| UNNAMED_PRODUCT.to_string(), |s| s.trim().to_string());

    let original_price = Some(parse_price(item.text(columns::RETAIL_PRICE)))
        .filter(|price| *price > Decimal::ZERO);

    let comment_count = item.text(columns::COMMENT_COUNT);
    let review_count_display = meaningful(comment_count).unwrap_or("0").to_string();

    let main_image = item.text(columns::MAIN_IMAGE).map(str::trim);
    let image = main_image
        .or_else(|| item.text(columns::FIRST_DETAIL_IMAGE).map(str::trim))
        .map(str::to_string);

    Product::from(ProductRecord {
        id,
        name,
        price: parse_price(item.text(columns::SALE_PRICE)),
        original_price,
        rating: parse_rating(item.text(columns::AVERAGE_RATING)),
        review_count: parse_review_count(comment_count),
        review_count_display: Some(review_count_display),
        image,
        images: collect_images(item, main_image),
        category: Some(
            item.text(columns::CATEGORY_NAME)
                .map_or_else(|| DEFAULT_CATEGORY.to_string(), |s| s.trim().to_string()),
        ),
        variant_tag: None,
    })
}

/// Main image first (when present), then every non-blank `Detail Image <N>`
/// column in document order.
fn collect_images(item: &RawFeedItem, main_image: Option<&str>) -> Vec<String> {
    let details = item.fields().filter_map(|(key, value)| match value {
        RawValue::Text(url) if DETAIL_IMAGE_KEY.is_match(key) && !url.trim().is_empty() => {
            Some(url.trim())
        }
        _ => None,
    });

    main_image.into_iter().chain(details).map(str::to_string).collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
