//! Entry point for admin JSON uploads.
//!
//! An upload is a JSON array in one of two shapes: a raw feed export
//! (detected by a `"Product Name"` key on the first element) which goes
//! through normalization and cleaning, or an array of canonical products
//! which is only cleaned. Anything else is rejected before any product is
//! produced.

use serde::de::DeserializeOwned;
use serde_json::Value;
use trendlens_core::{Product, VariantTag};

use crate::clean::ProductCleaner;
use crate::error::IngestError;
use crate::normalize::{columns, normalize_feed};
use crate::types::RawFeedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    RawFeed,
    Canonical,
}

impl UploadFormat {
    fn label(self) -> &'static str {
        match self {
            UploadFormat::RawFeed => "raw feed",
            UploadFormat::Canonical => "product",
        }
    }
}

impl std::fmt::Display for UploadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed, cleaned upload ready to be saved into a category.
#[derive(Debug, Clone)]
pub struct Upload {
    pub format: UploadFormat,
    /// Number of array elements in the upload.
    pub received: usize,
    pub products: Vec<Product>,
}

/// Parses an admin upload and returns the cleaned products.
///
/// When `variant` is set every product is stamped with it, so the save
/// replaces only that partition of the category.
///
/// # Errors
///
/// Returns [`IngestError::Syntax`] for malformed JSON,
/// [`IngestError::NotAnArray`] when the top-level value is not an array, and
/// [`IngestError::InvalidRecord`] when an element does not fit the detected
/// format. No products are returned on error.
pub fn parse_upload(
    json: &str,
    cleaner: &ProductCleaner,
    variant: Option<VariantTag>,
) -> Result<Upload, IngestError> {
    let value: Value = serde_json::from_str(json).map_err(IngestError::Syntax)?;
    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            return Err(IngestError::NotAnArray {
                found: value_kind(&other),
            })
        }
    };

    let received = elements.len();
    let format = detect_format(&elements);

    let mut products = match format {
        UploadFormat::RawFeed => {
            let items: Vec<RawFeedItem> = decode_elements(elements, format)?;
            normalize_feed(&items)
        }
        UploadFormat::Canonical => decode_elements(elements, format)?,
    };

    if let Some(tag) = variant {
        for product in &mut products {
            product.variant_tag = Some(tag);
        }
    }

    let products = cleaner.clean(products);
    tracing::info!(
        %format,
        received,
        accepted = products.len(),
        variant = ?variant,
        "parsed admin upload"
    );

    Ok(Upload {
        format,
        received,
        products,
    })
}

fn detect_format(elements: &[Value]) -> UploadFormat {
    let is_raw = elements
        .first()
        .and_then(Value::as_object)
        .and_then(|first| first.get(columns::PRODUCT_NAME))
        .is_some_and(|name| !name.is_null());

    if is_raw {
        UploadFormat::RawFeed
    } else {
        UploadFormat::Canonical
    }
}

fn decode_elements<T: DeserializeOwned>(
    elements: Vec<Value>,
    format: UploadFormat,
) -> Result<Vec<T>, IngestError> {
    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            serde_json::from_value(element).map_err(|source| IngestError::InvalidRecord {
                index,
                format: format.label(),
                source,
            })
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
