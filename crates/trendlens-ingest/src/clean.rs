//! Validation, keyword exclusion and deduplication of product batches.

use std::collections::HashSet;

use rust_decimal::Decimal;
use trendlens_core::Product;

use crate::ids::is_fallback_id;
use crate::normalize::UNNAMED_PRODUCT;

/// Lowercase substrings that mark a product as non-apparel.
///
/// Matching is a plain substring test on the lowercased name, so entries are
/// chosen to avoid hitting garment names (`"phone case"` rather than
/// `"phone"`, `"boots"` rather than `"boot"` which would catch bootcut jeans,
/// `"usb cable"` rather than `"cable"` which would catch cable-knit sweaters).
pub const DEFAULT_EXCLUDED_KEYWORDS: &[&str] = &[
    // glue / adhesives
    "glue",
    "pegamento",
    "adhesive",
    "adhesivo",
    // mattresses
    "mattress",
    "colchón",
    "colchon",
    // lashes
    "lashes",
    "eyelash",
    "pestañas",
    // figures and toys
    "figurine",
    "action figure",
    "figura",
    "toys",
    "juguete",
    // nails
    "nail",
    "uñas",
    // makeup
    "makeup",
    "maquillaje",
    "lipstick",
    "labial",
    // phone accessories
    "phone case",
    "funda para",
    "funda de",
    "usb cable",
    "charging cable",
    "cable usb",
    "cable de carga",
    "charger",
    "cargador",
    // headphones
    "headphone",
    "earbuds",
    "audífonos",
    "audifonos",
    "auriculares",
    // boots
    "boots",
    "botas",
    // hair ties
    "hair tie",
    "scrunchie",
    "coletero",
    "liga para el cabello",
    // games
    "game",
    "videojuego",
    "juego de mesa",
    // fanny packs
    "fanny pack",
    "waist bag",
    "riñonera",
    // disinfectant
    "disinfectant",
    "desinfectante",
    // socks
    "socks",
    "calcetines",
    "calcetas",
    // blankets
    "blanket",
    "cobija",
    "frazada",
];

/// Why a product was dropped by [`ProductCleaner::clean`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingName,
    Unnamed,
    NonPositivePrice,
    MissingImage,
    ExcludedKeyword(String),
    Duplicate(String),
}

/// Filters product batches down to valid, apparel-only, unique entries.
///
/// Cleaning is a stable filter: surviving products keep their input order,
/// and cleaning an already-clean batch returns it unchanged.
#[derive(Debug, Clone)]
pub struct ProductCleaner {
    excluded_keywords: Vec<String>,
}

impl Default for ProductCleaner {
    fn default() -> Self {
        Self {
            excluded_keywords: DEFAULT_EXCLUDED_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
        }
    }
}

impl ProductCleaner {
    /// Built-in exclusion list plus `extra` keywords (lowercased, blanks
    /// skipped).
    #[must_use]
    pub fn with_extra_keywords<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaner = Self::default();
        cleaner.excluded_keywords.extend(
            extra
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty()),
        );
        cleaner
    }

    #[must_use]
    pub fn excluded_keywords(&self) -> &[String] {
        &self.excluded_keywords
    }

    /// Runs the validity filter, the keyword filter and deduplication, in
    /// that order, keeping the first product seen for each dedup key.
    #[must_use]
    pub fn clean(&self, products: Vec<Product>) -> Vec<Product> {
        let received = products.len();
        let mut seen: HashSet<String> = HashSet::with_capacity(received);
        let mut invalid = 0usize;
        let mut excluded = 0usize;
        let mut duplicates = 0usize;

        let kept: Vec<Product> = products
            .into_iter()
            .filter(|product| match self.check(product, &mut seen) {
                None => true,
                Some(rejection) => {
                    match rejection {
                        Rejection::ExcludedKeyword(_) => excluded += 1,
                        Rejection::Duplicate(_) => duplicates += 1,
                        _ => invalid += 1,
                    }
                    false
                }
            })
            .collect();

        tracing::debug!(
            received,
            kept = kept.len(),
            invalid,
            excluded,
            duplicates,
            "cleaned product batch"
        );
        kept
    }

    fn check(&self, product: &Product, seen: &mut HashSet<String>) -> Option<Rejection> {
        if let Some(rejection) = self.rejection(product) {
            return Some(rejection);
        }
        let key = dedup_key(product);
        if seen.insert(key.to_string()) {
            None
        } else {
            Some(Rejection::Duplicate(key.to_string()))
        }
    }

    /// Validity and keyword checks for a single product, without
    /// deduplication.
    #[must_use]
    pub fn rejection(&self, product: &Product) -> Option<Rejection> {
        let name = product.name.trim();
        if name.is_empty() {
            return Some(Rejection::MissingName);
        }
        if name == UNNAMED_PRODUCT {
            return Some(Rejection::Unnamed);
        }
        if product.price <= Decimal::ZERO {
            return Some(Rejection::NonPositivePrice);
        }
        if product.primary_image().is_none() {
            return Some(Rejection::MissingImage);
        }

        let lower = name.to_lowercase();
        self.excluded_keywords
            .iter()
            .find(|keyword| lower.contains(keyword.as_str()))
            .map(|keyword| Rejection::ExcludedKeyword(keyword.clone()))
    }
}

/// The identity used for deduplication: the product id when it came from the
/// feed, otherwise the product name.
#[must_use]
pub fn dedup_key(product: &Product) -> &str {
    if product.id.is_empty() || is_fallback_id(&product.id) {
        &product.name
    } else {
        &product.id
    }
}

/// Cleans `products` with the built-in exclusion list.
#[must_use]
pub fn clean_products(products: Vec<Product>) -> Vec<Product> {
    ProductCleaner::default().clean(products)
}
