//! Read-side commands: `show`, `stats` and `favorite`.

use trendlens_core::{category_stats, sort_products, CategoryKey, Product, SortKey};
use trendlens_store::Catalog;

const NAME_WIDTH: usize = 50;

fn truncate(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        format!("{}...", name.chars().take(NAME_WIDTH).collect::<String>())
    } else {
        name.to_string()
    }
}

pub(crate) fn format_row(product: &Product) -> String {
    format!(
        "{:<24}{:<8}{:<8}{:<10}{:<10}{}",
        product.id,
        product.popularity().to_string(),
        product.rating().to_string(),
        product.review_count_display,
        product.price.to_string(),
        truncate(&product.name)
    )
}

/// Prints the products of `category` sorted by `sort`.
///
/// # Errors
///
/// Returns an error if the category cannot be loaded.
pub(crate) async fn run_show(
    catalog: &Catalog,
    category: CategoryKey,
    sort: SortKey,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let mut products = catalog.load(category).await?;
    if products.is_empty() {
        println!("no products in {category}; run `ingest` first");
        return Ok(());
    }

    sort_products(&mut products, sort);
    let shown = limit.unwrap_or(products.len()).min(products.len());

    let header = format!(
        "{:<24}{:<8}{:<8}{:<10}{:<10}NAME",
        "ID", "POP", "RATING", "REVIEWS", "PRICE"
    );
    println!("{header}");
    for product in &products[..shown] {
        println!("{}", format_row(product));
    }
    if shown < products.len() {
        println!("... {} more", products.len() - shown);
    }
    Ok(())
}

/// Prints summary figures for `category`.
///
/// # Errors
///
/// Returns an error if the category cannot be loaded.
pub(crate) async fn run_stats(catalog: &Catalog, category: CategoryKey) -> anyhow::Result<()> {
    let products = catalog.load(category).await?;
    let Some(stats) = category_stats(&products) else {
        println!("no products in {category}; run `ingest` first");
        return Ok(());
    };

    println!("Category: {category}");
    println!("Products: {}", stats.product_count);
    println!("High popularity: {}", stats.high_popularity);
    println!("Total reviews: {}", stats.total_reviews);
    println!("Average price: {}", stats.average_price);
    println!(
        "Top product: {} ({})",
        truncate(&stats.top_product.name),
        stats.top_product.id
    );
    Ok(())
}

/// Toggles product `id` of `category` in favorites.
///
/// A favorite whose product has since left the category can still be
/// removed.
///
/// # Errors
///
/// Returns an error if loading or saving fails, or the product is neither in
/// the category nor a favorite.
pub(crate) async fn run_favorite(
    catalog: &Catalog,
    category: CategoryKey,
    id: &str,
) -> anyhow::Result<()> {
    let products = catalog.load(category).await?;
    catalog.load(CategoryKey::Favorites).await?;

    if let Some(product) = products.into_iter().find(|p| p.id == id) {
        let name = product.name.clone();
        if catalog.toggle_favorite(product).await? {
            println!("added {name} to favorites");
        } else {
            println!("removed {name} from favorites");
        }
        return Ok(());
    }

    if catalog.remove_favorite(id).await? {
        println!("removed {id} from favorites");
        Ok(())
    } else {
        anyhow::bail!("product '{id}' not found in {category}")
    }
}
