use trendlens_core::Popularity;

use super::*;
use crate::ids::is_fallback_id;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn make_row(id: &str) -> RawFeedItem {
    RawFeedItem::new()
        .with("id", id)
        .with("Product Name", "Floral Dress")
        .with("Sale Price", "$12.99")
        .with("Retail Price", "$18.00")
        .with("Comment Count", "1,240")
        .with("Average Rating", "4.8")
        .with("Main Image", "http://x/1.jpg")
        .with("Category Name", "Dresses")
}

// -----------------------------------------------------------------------
// normalize_feed
// -----------------------------------------------------------------------

#[test]
fn normalize_feed_end_to_end_example() {
    let json = r#"[{"id":"p1","Product Name":"Floral Dress","Sale Price":"$12.99","Comment Count":"1,240","Average Rating":"4.8","Main Image":"http://x/1.jpg"}]"#;
    let items: Vec<RawFeedItem> = serde_json::from_str(json).unwrap();
    let products = normalize_feed(&items);

    assert_eq!(products.len(), 1);
    let p = &products[0];
    assert_eq!(p.id, "p1");
    assert_eq!(p.price, dec("12.99"));
    assert_eq!(p.review_count(), 1240);
    assert_eq!(p.rating(), dec("4.8"));
    assert_eq!(p.popularity(), Popularity::High);
    assert_eq!(p.images, vec!["http://x/1.jpg"]);
    assert_eq!(p.category.as_deref(), Some(DEFAULT_CATEGORY));
    assert!(p.original_price.is_none());
}

#[test]
fn normalize_feed_drops_quota_notice_and_missing_ids() {
    let items = vec![
        make_row("p1"),
        RawFeedItem::new().with("Product Name", "No id"),
        make_row("   "),
        make_row("Free Version is limited to 25 rows, upgrade to see the 95 other rows"),
        make_row("p2"),
    ];
    let products = normalize_feed(&items);
    let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[test]
fn normalize_feed_does_not_deduplicate() {
    let items = vec![make_row("p1"), make_row("p1")];
    assert_eq!(normalize_feed(&items).len(), 2);
}

// -----------------------------------------------------------------------
// normalize_item
// -----------------------------------------------------------------------

#[test]
fn normalize_item_maps_prices() {
    let p = normalize_item(&make_row("p1"));
    assert_eq!(p.price, dec("12.99"));
    assert_eq!(p.original_price, Some(dec("18.00")));
}

#[test]
fn normalize_item_unavailable_retail_price_is_none() {
    let row = RawFeedItem::new()
        .with("id", "p1")
        .with("Retail Price", "Not Available");
    assert!(normalize_item(&row).original_price.is_none());
}

#[test]
fn normalize_item_id_falls_back_to_product_code() {
    let row = RawFeedItem::new()
        .with("Product Code", "sw2304118427")
        .with("Product Name", "Cable Knit Sweater");
    assert_eq!(normalize_item(&row).id, "sw2304118427");
}

#[test]
fn normalize_item_id_falls_back_to_generated() {
    let row = RawFeedItem::new().with("Product Name", "Cable Knit Sweater");
    let p = normalize_item(&row);
    assert!(is_fallback_id(&p.id), "expected generated id, got {}", p.id);
}

#[test]
fn normalize_item_missing_name_uses_marker() {
    let row = RawFeedItem::new().with("id", "p1");
    assert_eq!(normalize_item(&row).name, UNNAMED_PRODUCT);
}

#[test]
fn normalize_item_keeps_plus_suffix_for_display() {
    let row = make_row("p1").with("Comment Count", "ignored");
    // First occurrence of a repeated column wins.
    assert_eq!(normalize_item(&row).review_count_display, "1,240");

    let row = RawFeedItem::new()
        .with("id", "p1")
        .with("Comment Count", "1000+");
    let p = normalize_item(&row);
    assert_eq!(p.review_count_display, "1000+");
    assert_eq!(p.review_count(), 1000);
}

#[test]
fn normalize_item_unavailable_count_displays_zero() {
    let row = RawFeedItem::new()
        .with("id", "p1")
        .with("Comment Count", "Not Available");
    let p = normalize_item(&row);
    assert_eq!(p.review_count_display, "0");
    assert_eq!(p.review_count(), 0);
}

#[test]
fn normalize_item_collects_detail_images_in_document_order() {
    let row = RawFeedItem::new()
        .with("id", "p1")
        .with("Main Image", "http://x/main.jpg")
        .with("Detail Image 3", "http://x/3.jpg")
        .with("Detail Image 1", "http://x/1.jpg")
        .with("Detail Image 2", "")
        .with("Detail Image Alt", "http://x/alt.jpg")
        .with("Detail Image 10", "http://x/10.jpg");
    let p = normalize_item(&row);
    assert_eq!(p.image.as_deref(), Some("http://x/main.jpg"));
    assert_eq!(
        p.images,
        vec![
            "http://x/main.jpg",
            "http://x/3.jpg",
            "http://x/1.jpg",
            "http://x/10.jpg"
        ]
    );
}

#[test]
fn normalize_item_image_falls_back_to_first_detail_image() {
    let row = RawFeedItem::new()
        .with("id", "p1")
        .with("Detail Image 2", "http://x/2.jpg")
        .with("Detail Image 1", "http://x/1.jpg");
    let p = normalize_item(&row);
    assert_eq!(p.image.as_deref(), Some("http://x/1.jpg"));
    assert_eq!(p.images, vec!["http://x/2.jpg", "http://x/1.jpg"]);
}

#[test]
fn normalize_item_without_images() {
    let p = normalize_item(&RawFeedItem::new().with("id", "p1"));
    assert!(p.image.is_none());
    assert!(p.images.is_empty());
}

#[test]
fn normalize_item_uses_category_column() {
    let p = normalize_item(&make_row("p1"));
    assert_eq!(p.category.as_deref(), Some("Dresses"));
    assert!(p.variant_tag.is_none());
}

#[test]
fn normalize_item_garbage_numbers_degrade_to_zero() {
    let row = RawFeedItem::new()
        .with("id", "p1")
        .with("Sale Price", "call us")
        .with("Average Rating", "n/a")
        .with("Comment Count", "lots");
    let p = normalize_item(&row);
    assert_eq!(p.price, Decimal::ZERO);
    assert_eq!(p.rating(), Decimal::ZERO);
    assert_eq!(p.review_count(), 0);
    assert_eq!(p.popularity(), Popularity::Low);
}
