mod catalog;
mod ingest;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendlens_core::{AppConfig, CategoryKey, SortKey, VariantTag};
use trendlens_ingest::ProductCleaner;
use trendlens_store::{Catalog, ChunkedStore, MemoryStorage, StoreConfig};

#[derive(Debug, Parser)]
#[command(name = "trendlens")]
#[command(about = "Trend catalog ingestion and inspection")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload a feed export or product list into a category
    Ingest {
        /// Target category (e.g. dresses, topsBlouses)
        #[arg(long)]
        category: CategoryKey,
        /// JSON file with a raw feed export or canonical products
        #[arg(long)]
        file: PathBuf,
        /// Replace only this partition of the category
        #[arg(long)]
        variant: Option<VariantTag>,
    },
    /// List the products of a category
    Show {
        #[arg(long)]
        category: CategoryKey,
        /// popularity, reviews, rating, price-asc or price-desc
        #[arg(long, default_value = "popularity")]
        sort: SortKey,
        /// Maximum number of products to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Summarize a category
    Stats {
        #[arg(long)]
        category: CategoryKey,
    },
    /// Toggle a product of a category in favorites
    Favorite {
        #[arg(long)]
        category: CategoryKey,
        /// Product id
        #[arg(long)]
        id: String,
    },
    /// Print category updates until interrupted
    Watch {
        /// Category to watch; repeat for several
        #[arg(long = "category", required = true)]
        categories: Vec<CategoryKey>,
        /// Seconds between snapshot file checks
        #[arg(long, default_value = "2")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = trendlens_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("trendlens: no command given, see --help");
        return Ok(());
    };

    let storage = Arc::new(
        MemoryStorage::open(&config.store_path)
            .await
            .with_context(|| format!("failed to open store at {}", config.store_path.display()))?,
    );
    let catalog = build_catalog(&config, storage.clone());
    tracing::debug!(env = %config.env, store = %config.store_path.display(), "catalog ready");

    match command {
        Commands::Ingest {
            category,
            file,
            variant,
        } => ingest::run_ingest(&catalog, category, &file, variant).await,
        Commands::Show {
            category,
            sort,
            limit,
        } => catalog::run_show(&catalog, category, sort, limit).await,
        Commands::Stats { category } => catalog::run_stats(&catalog, category).await,
        Commands::Favorite { category, id } => {
            catalog::run_favorite(&catalog, category, &id).await
        }
        Commands::Watch {
            categories,
            interval,
        } => watch::run_watch(&catalog, &storage, &categories, interval).await,
    }
}

fn build_catalog(config: &AppConfig, storage: Arc<MemoryStorage>) -> Catalog {
    let cleaner = ProductCleaner::with_extra_keywords(&config.extra_excluded_keywords);
    Catalog::new(ChunkedStore::new(
        storage,
        cleaner,
        StoreConfig::from_app_config(config),
    ))
}
