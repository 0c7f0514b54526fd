//! Tolerant string-to-number parsing for scraped feed fields.
//!
//! Every parser here is total: absent values, the `"Not Available"` sentinel
//! and anything unparseable all come back as zero. A malformed field degrades
//! one record instead of aborting the batch.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Placeholder the feed exporter writes for fields it could not scrape.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Trims `raw` and drops it when empty or equal to [`NOT_AVAILABLE`].
pub(crate) fn meaningful(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && *s != NOT_AVAILABLE)
}

/// Parses a display price such as `"$1,234.50"` or `"US$ 12.99"`.
///
/// Leading currency symbols and thousands separators are stripped, and only
/// the leading numeric run is read, so `"12.99 USD"` is `12.99`. Negative and
/// unparseable values yield `0`.
#[must_use]
pub fn parse_price(raw: Option<&str>) -> Decimal {
    let Some(value) = meaningful(raw) else {
        return Decimal::ZERO;
    };

    let numeric = value.trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'));
    if numeric.starts_with('-') {
        return Decimal::ZERO;
    }
    let cleaned: String = numeric
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    Decimal::from_str(decimal_prefix(&cleaned)).unwrap_or(Decimal::ZERO)
}

/// Parses a review counter such as `"1,000+"` into its integer floor.
///
/// Reading stops at the first non-digit, so `"1.2k"` is `1`.
#[must_use]
pub fn parse_review_count(raw: Option<&str>) -> u64 {
    let Some(value) = meaningful(raw) else {
        return 0;
    };

    let cleaned: String = value
        .chars()
        .filter(|c| *c != '+' && *c != ',' && !c.is_whitespace())
        .collect();
    let digits = cleaned
        .find(|c: char| !c.is_ascii_digit())
        .map_or(cleaned.as_str(), |end| &cleaned[..end]);

    digits.parse::<u64>().unwrap_or(0)
}

/// Parses an average rating, clamped to `[0, 5]`.
///
/// Trailing text is ignored, so `"4.5 out of 5"` is `4.5`.
#[must_use]
pub fn parse_rating(raw: Option<&str>) -> Decimal {
    let Some(value) = meaningful(raw).filter(|s| *s != "0") else {
        return Decimal::ZERO;
    };
    if value.starts_with('-') {
        return Decimal::ZERO;
    }

    Decimal::from_str(decimal_prefix(value))
        .map(|rating| rating.min(Decimal::from(5)))
        .unwrap_or(Decimal::ZERO)
}

// Leading run of ASCII digits with at most one decimal point.
fn decimal_prefix(s: &str) -> &str {
    let mut seen_point = false;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_point {
                seen_point = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map_or(s.len(), |(i, _)| i);
    &s[..end]
}
