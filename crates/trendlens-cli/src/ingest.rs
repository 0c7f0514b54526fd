//! `ingest` command: admin upload into a category.

use std::path::Path;

use anyhow::Context;
use trendlens_core::{CategoryKey, VariantTag};
use trendlens_ingest::parse_upload;
use trendlens_store::Catalog;

/// Reads `file`, runs it through the upload pipeline and saves the result.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a valid upload, or
/// the save fails. Nothing is stored unless the whole upload parses.
pub(crate) async fn run_ingest(
    catalog: &Catalog,
    category: CategoryKey,
    file: &Path,
    variant: Option<VariantTag>,
) -> anyhow::Result<()> {
    let json = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let upload = parse_upload(&json, catalog.store().cleaner(), variant)
        .with_context(|| format!("rejected upload {}", file.display()))?;
    let accepted = upload.products.len();

    let report = catalog
        .save(category, upload.products)
        .await
        .with_context(|| format!("failed to save {category}"))?;

    println!(
        "ingested {accepted} of {} {} records into {category}{}",
        upload.received,
        upload.format,
        variant.map(|v| format!(" ({v})")).unwrap_or_default()
    );
    println!(
        "{category} now holds {} products in {} chunks{}",
        report.products.len(),
        report.chunks_written,
        if report.replaced_legacy {
            ", legacy document migrated"
        } else {
            ""
        }
    );
    Ok(())
}
