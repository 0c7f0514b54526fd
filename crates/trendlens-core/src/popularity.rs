//! Three-tier popularity classification derived from rating and review volume.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rating contributes at most this many points (a perfect 5.0 rating).
const RATING_WEIGHT: i64 = 40;
/// Review volume contributes at most this many points.
const REVIEW_WEIGHT: i64 = 60;
/// Review count at which the review component saturates.
const REVIEW_SATURATION: u64 = 1_000;

const HIGH_THRESHOLD: i64 = 70;
const MEDIUM_THRESHOLD: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Popularity {
    High,
    Medium,
    Low,
}

impl Popularity {
    /// Ordinal used for sorting: `High` = 3, `Medium` = 2, `Low` = 1.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Popularity::High => 3,
            Popularity::Medium => 2,
            Popularity::Low => 1,
        }
    }
}

impl std::fmt::Display for Popularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Popularity::High => write!(f, "high"),
            Popularity::Medium => write!(f, "medium"),
            Popularity::Low => write!(f, "low"),
        }
    }
}

/// Scores a product from its average rating (0 to 5) and parsed review count.
///
/// `rating / 5 * 40 + min(reviews / 1000 * 60, 60)`, then `>= 70` is
/// [`Popularity::High`] and `>= 40` is [`Popularity::Medium`]. The arithmetic
/// runs on [`Decimal`] so the inclusive thresholds are hit exactly.
#[must_use]
pub fn popularity_score(rating: Decimal, review_count: u64) -> Popularity {
    let rating = rating.clamp(Decimal::ZERO, Decimal::from(5));
    let rating_score = rating * Decimal::from(RATING_WEIGHT) / Decimal::from(5);

    let review_score = if review_count >= REVIEW_SATURATION {
        Decimal::from(REVIEW_WEIGHT)
    } else {
        Decimal::from(review_count) * Decimal::from(REVIEW_WEIGHT)
            / Decimal::from(REVIEW_SATURATION)
    };

    let total = rating_score + review_score;
    if total >= Decimal::from(HIGH_THRESHOLD) {
        Popularity::High
    } else if total >= Decimal::from(MEDIUM_THRESHOLD) {
        Popularity::Medium
    } else {
        Popularity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    #[test]
    fn perfect_rating_with_saturated_reviews_is_high() {
        assert_eq!(popularity_score(dec("5"), 1000), Popularity::High);
    }

    #[test]
    fn no_signal_is_low() {
        assert_eq!(popularity_score(Decimal::ZERO, 0), Popularity::Low);
    }

    #[test]
    fn total_of_exactly_seventy_is_high() {
        // 40 (rating) + 30 (500 reviews)
        assert_eq!(popularity_score(dec("5"), 500), Popularity::High);
        // 10 (1.25 rating) + 60 (saturated)
        assert_eq!(popularity_score(dec("1.25"), 5000), Popularity::High);
    }

    #[test]
    fn total_just_below_seventy_is_medium() {
        assert_eq!(popularity_score(dec("5"), 499), Popularity::Medium);
    }

    #[test]
    fn total_of_exactly_forty_is_medium() {
        assert_eq!(popularity_score(dec("5"), 0), Popularity::Medium);
        // 10 (1.25 rating) + 30 (500 reviews)
        assert_eq!(popularity_score(dec("1.25"), 500), Popularity::Medium);
    }

    #[test]
    fn total_just_below_forty_is_low() {
        assert_eq!(popularity_score(Decimal::ZERO, 666), Popularity::Low);
    }

    #[test]
    fn review_component_saturates() {
        assert_eq!(
            popularity_score(dec("1"), 1_000),
            popularity_score(dec("1"), u64::MAX)
        );
    }

    #[test]
    fn out_of_range_rating_is_clamped() {
        assert_eq!(popularity_score(dec("9"), 0), Popularity::Medium);
        assert_eq!(popularity_score(dec("-3"), 0), Popularity::Low);
    }

    #[test]
    fn score_is_monotonic_in_both_arguments() {
        let ratings: Vec<Decimal> = (0..=50).map(|n| Decimal::new(n, 1)).collect();
        let reviews: Vec<u64> = (0..=40).map(|n| n * 50).collect();

        for &rating in &ratings {
            let mut previous = 0;
            for &count in &reviews {
                let rank = popularity_score(rating, count).rank();
                assert!(rank >= previous, "not monotonic at {rating}, {count}");
                previous = rank;
            }
        }

        for &count in &reviews {
            let mut previous = 0;
            for &rating in &ratings {
                let rank = popularity_score(rating, count).rank();
                assert!(rank >= previous, "not monotonic at {rating}, {count}");
                previous = rank;
            }
        }
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Popularity::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
