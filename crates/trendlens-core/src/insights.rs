//! Dashboard-side views over a category: ordering and summary figures.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::products::Product;
use crate::CoreError;

/// Orderings offered by the product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Popularity,
    Reviews,
    Rating,
    PriceAsc,
    PriceDesc,
}

impl std::str::FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "popularity" => Ok(SortKey::Popularity),
            "reviews" => Ok(SortKey::Reviews),
            "rating" => Ok(SortKey::Rating),
            "price-asc" | "priceasc" => Ok(SortKey::PriceAsc),
            "price-desc" | "pricedesc" => Ok(SortKey::PriceDesc),
            _ => Err(CoreError::UnknownSortKey(s.to_string())),
        }
    }
}

/// Sorts `products` in place. The sort is stable, so equal keys keep their
/// stored order.
pub fn sort_products(products: &mut [Product], key: SortKey) {
    match key {
        SortKey::Popularity => {
            products.sort_by(|a, b| b.popularity().rank().cmp(&a.popularity().rank()));
        }
        SortKey::Reviews => products.sort_by(|a, b| b.review_count().cmp(&a.review_count())),
        SortKey::Rating => products.sort_by(|a, b| b.rating().cmp(&a.rating())),
        SortKey::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
    }
}

/// Summary figures shown above a category grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub product_count: usize,
    pub high_popularity: usize,
    pub total_reviews: u64,
    /// Mean price rounded to cents.
    pub average_price: Decimal,
    pub top_product: Product,
}

/// Computes [`CategoryStats`] for a category, or `None` when it is empty.
///
/// The top product is the most popular one, ties broken by rating, then by
/// position (first wins).
#[must_use]
pub fn category_stats(products: &[Product]) -> Option<CategoryStats> {
    let first = products.first()?;

    let high_popularity = products
        .iter()
        .filter(|p| p.popularity() == crate::Popularity::High)
        .count();
    let total_reviews = products
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.review_count()));
    let average_price = mean_price(products).round_dp(2);

    let top_product = products.iter().skip(1).fold(first, |best, candidate| {
        match compare_prominence(candidate, best) {
            Ordering::Greater => candidate,
            _ => best,
        }
    });

    Some(CategoryStats {
        product_count: products.len(),
        high_popularity,
        total_reviews,
        average_price,
        top_product: top_product.clone(),
    })
}

// Falls back to summing per-item shares when the plain total overflows, and
// saturates if even that does not fit.
fn mean_price(products: &[Product]) -> Decimal {
    let count = Decimal::from(products.len());
    products
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.price))
        .and_then(|total| total.checked_div(count))
        .or_else(|| {
            products
                .iter()
                .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.price / count))
        })
        .unwrap_or(Decimal::MAX)
}

fn compare_prominence(a: &Product, b: &Product) -> Ordering {
    a.popularity()
        .rank()
        .cmp(&b.popularity().rank())
        .then_with(|| a.rating().cmp(&b.rating()))
}
