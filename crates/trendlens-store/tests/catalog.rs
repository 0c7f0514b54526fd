//! Integration tests for `Catalog` on top of `ChunkedStore`.
//!
//! Storage faults and interleavings are produced by thin wrappers around
//! `MemoryStorage` that implement `CatalogStorage` themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Barrier};
use trendlens_core::{CategoryKey, Product, ProductRecord, VariantTag};
use trendlens_ingest::ProductCleaner;
use trendlens_store::{
    Catalog, CatalogStorage, ChangeReceiver, ChunkWrite, ChunkedStore, MemoryStorage, StoreConfig,
    StoreError, StoredChunk,
};

fn product(id: &str, tag: Option<VariantTag>) -> Product {
    Product::from(ProductRecord {
        id: id.to_string(),
        name: format!("Linen Set {id}"),
        price: "31.00".parse().unwrap(),
        rating: "4.6".parse().unwrap(),
        review_count: 1_500,
        image: Some(format!("http://img/{id}.jpg")),
        variant_tag: tag,
        ..ProductRecord::default()
    })
}

fn ids(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}

fn catalog_over(storage: Arc<dyn CatalogStorage>) -> Catalog {
    Catalog::new(ChunkedStore::new(
        storage,
        ProductCleaner::default(),
        StoreConfig { chunk_size: 2 },
    ))
}

/// Fails every write and, optionally, every chunk listing of one category.
struct Faulty {
    inner: MemoryStorage,
    fail_writes: AtomicBool,
    broken_category: Option<CategoryKey>,
}

impl Faulty {
    fn new(broken_category: Option<CategoryKey>) -> Self {
        Self {
            inner: MemoryStorage::new(),
            fail_writes: AtomicBool::new(false),
            broken_category,
        }
    }
}

#[async_trait::async_trait]
impl CatalogStorage for Faulty {
    async fn list_chunks(&self, category: CategoryKey) -> Result<Vec<StoredChunk>, StoreError> {
        if self.broken_category == Some(category) {
            return Err(StoreError::Backend("listing unavailable".to_string()));
        }
        self.inner.list_chunks(category).await
    }

    async fn write_chunks(
        &self,
        category: CategoryKey,
        batch: ChunkWrite,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write rejected".to_string()));
        }
        self.inner.write_chunks(category, batch).await
    }

    async fn read_legacy(
        &self,
        category: CategoryKey,
    ) -> Result<Option<Vec<Product>>, StoreError> {
        self.inner.read_legacy(category).await
    }

    fn subscribe_chunks(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError> {
        self.inner.subscribe_chunks(category)
    }

    fn subscribe_legacy(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError> {
        self.inner.subscribe_legacy(category)
    }
}

/// Holds every chunk listing until two loads are in flight.
struct Gated {
    inner: Arc<MemoryStorage>,
    barrier: Barrier,
}

#[async_trait::async_trait]
impl CatalogStorage for Gated {
    async fn list_chunks(&self, category: CategoryKey) -> Result<Vec<StoredChunk>, StoreError> {
        let chunks = self.inner.list_chunks(category).await;
        self.barrier.wait().await;
        chunks
    }

    async fn write_chunks(
        &self,
        category: CategoryKey,
        batch: ChunkWrite,
    ) -> Result<(), StoreError> {
        self.inner.write_chunks(category, batch).await
    }

    async fn read_legacy(
        &self,
        category: CategoryKey,
    ) -> Result<Option<Vec<Product>>, StoreError> {
        self.inner.read_legacy(category).await
    }

    fn subscribe_chunks(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError> {
        self.inner.subscribe_chunks(category)
    }

    fn subscribe_legacy(&self, category: CategoryKey) -> Result<ChangeReceiver, StoreError> {
        self.inner.subscribe_legacy(category)
    }
}

// ---------------------------------------------------------------------------
// cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cache_starts_empty_for_every_category() {
    let catalog = catalog_over(Arc::new(MemoryStorage::new()));
    for category in CategoryKey::ALL {
        assert!(catalog.products(category).is_empty());
    }
}

#[tokio::test]
async fn save_updates_the_cache_immediately() {
    let catalog = catalog_over(Arc::new(MemoryStorage::new()));
    let report = catalog
        .save(CategoryKey::Vacation, vec![product("v1", None), product("v2", None)])
        .await
        .unwrap();
    assert_eq!(catalog.products(CategoryKey::Vacation), report.products);
    assert_eq!(report.chunks_written, 1);
}

#[tokio::test]
async fn load_reads_what_another_process_saved() {
    let storage = Arc::new(MemoryStorage::new());
    let writer = catalog_over(storage.clone());
    let reader = catalog_over(storage);

    writer
        .save(CategoryKey::Dresses, vec![product("d1", None)])
        .await
        .unwrap();
    assert!(reader.products(CategoryKey::Dresses).is_empty());

    reader.load(CategoryKey::Dresses).await.unwrap();
    assert_eq!(ids(&reader.products(CategoryKey::Dresses)), vec!["d1"]);
}

#[tokio::test]
async fn failed_save_keeps_cache_and_storage() {
    let storage = Arc::new(Faulty::new(None));
    let catalog = catalog_over(storage.clone());
    catalog
        .save(CategoryKey::Knitwear, vec![product("k1", None)])
        .await
        .unwrap();

    storage.fail_writes.store(true, Ordering::SeqCst);
    let err = catalog
        .save(CategoryKey::Knitwear, vec![product("k2", None), product("k3", None)])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("write rejected"));

    assert_eq!(ids(&catalog.products(CategoryKey::Knitwear)), vec!["k1"]);
    let stored = storage.inner.list_chunks(CategoryKey::Knitwear).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(ids(&stored[0].products), vec!["k1"]);
}

#[tokio::test]
async fn load_all_reports_each_category_independently() {
    let storage = Arc::new(Faulty::new(Some(CategoryKey::TrendsNow)));
    storage
        .inner
        .put_legacy(CategoryKey::Dresses, vec![product("d1", None)])
        .await
        .unwrap();
    let catalog = catalog_over(storage);

    let results = catalog.load_all().await;
    assert_eq!(results.len(), CategoryKey::ALL.len());
    for (category, result) in results {
        match category {
            CategoryKey::TrendsNow => assert!(result.is_err()),
            CategoryKey::Dresses => assert_eq!(result.unwrap(), 1),
            _ => assert_eq!(result.unwrap(), 0),
        }
    }
    assert_eq!(ids(&catalog.products(CategoryKey::Dresses)), vec!["d1"]);
}

// ---------------------------------------------------------------------------
// favorites
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_favorite_adds_then_removes() {
    let storage = Arc::new(MemoryStorage::new());
    let catalog = catalog_over(storage.clone());

    assert!(catalog.toggle_favorite(product("f1", None)).await.unwrap());
    assert!(catalog.is_favorite("f1"));
    assert!(catalog.toggle_favorite(product("f2", None)).await.unwrap());
    assert_eq!(ids(&catalog.products(CategoryKey::Favorites)), vec!["f1", "f2"]);

    assert!(!catalog.toggle_favorite(product("f1", None)).await.unwrap());
    assert!(!catalog.is_favorite("f1"));

    let reloaded = catalog_over(storage);
    reloaded.load(CategoryKey::Favorites).await.unwrap();
    assert_eq!(ids(&reloaded.products(CategoryKey::Favorites)), vec!["f2"]);
}

#[tokio::test]
async fn adding_an_existing_favorite_is_a_no_op() {
    let catalog = catalog_over(Arc::new(MemoryStorage::new()));
    assert!(catalog.add_favorite(product("f1", None)).await.unwrap());
    assert!(!catalog.add_favorite(product("f1", None)).await.unwrap());
    assert_eq!(catalog.products(CategoryKey::Favorites).len(), 1);
    assert!(!catalog.remove_favorite("nope").await.unwrap());
}

#[tokio::test]
async fn favorites_changed_from_a_cold_catalog_keep_stored_ones() {
    let storage = Arc::new(MemoryStorage::new());
    let first = catalog_over(storage.clone());
    first.add_favorite(product("f1", None)).await.unwrap();
    first.add_favorite(product("f2", None)).await.unwrap();

    let cold = catalog_over(storage.clone());
    assert!(cold.add_favorite(product("f3", None)).await.unwrap());
    assert_eq!(
        ids(&catalog_over(storage.clone()).load(CategoryKey::Favorites).await.unwrap()),
        vec!["f1", "f2", "f3"]
    );

    let cold = catalog_over(storage.clone());
    assert!(!cold.add_favorite(product("f2", None)).await.unwrap());
    assert!(cold.remove_favorite("f1").await.unwrap());

    let cold = catalog_over(storage.clone());
    assert!(!cold.toggle_favorite(product("f3", None)).await.unwrap());
    assert_eq!(
        ids(&catalog_over(storage).load(CategoryKey::Favorites).await.unwrap()),
        vec!["f2"]
    );
}

#[tokio::test]
async fn tagged_favorites_are_stored_untagged() {
    let catalog = catalog_over(Arc::new(MemoryStorage::new()));
    catalog
        .add_favorite(product("c1", Some(VariantTag::Curvy)))
        .await
        .unwrap();
    catalog
        .add_favorite(product("s1", Some(VariantTag::Standard)))
        .await
        .unwrap();
    assert!(catalog.remove_favorite("c1").await.unwrap());

    let favorites = catalog.products(CategoryKey::Favorites);
    assert_eq!(ids(&favorites), vec!["s1"]);
    assert!(favorites.iter().all(|p| p.variant_tag.is_none()));
}

// ---------------------------------------------------------------------------
// subscriptions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscription_keeps_the_cache_fresh() {
    let storage = Arc::new(MemoryStorage::new());
    let watcher = catalog_over(storage.clone());
    let writer = catalog_over(storage.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = watcher
        .subscribe(CategoryKey::Dresses, move |products| {
            let _ = tx.send(products.len());
        })
        .unwrap();
    assert_eq!(rx.recv().await, Some(0));

    writer
        .save(
            CategoryKey::Dresses,
            vec![product("d1", None), product("d2", None), product("d3", None)],
        )
        .await
        .unwrap();
    let delivered = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert_eq!(delivered, Some(3));
    assert_eq!(ids(&watcher.products(CategoryKey::Dresses)), vec!["d1", "d2", "d3"]);

    subscription.unsubscribe().await;
    assert_eq!(storage.watcher_count(CategoryKey::Dresses), 0);
}

// ---------------------------------------------------------------------------
// concurrency
// ---------------------------------------------------------------------------

/// Saves are not compare-and-swap: when two saves of different partitions
/// both load before either writes, the second write drops the first one's
/// partition. This pins the known lost-update behavior.
#[tokio::test]
async fn concurrent_partition_saves_can_lose_an_update() {
    let inner = Arc::new(MemoryStorage::new());
    let gated = Arc::new(Gated {
        inner: inner.clone(),
        barrier: Barrier::new(2),
    });
    let catalog = catalog_over(gated);

    let (curvy, standard) = tokio::join!(
        catalog.save(CategoryKey::Dresses, vec![product("c1", Some(VariantTag::Curvy))]),
        catalog.save(CategoryKey::Dresses, vec![product("s1", Some(VariantTag::Standard))]),
    );
    curvy.unwrap();
    standard.unwrap();

    let stored: Vec<Product> = inner
        .list_chunks(CategoryKey::Dresses)
        .await
        .unwrap()
        .into_iter()
        .flat_map(|chunk| chunk.products)
        .collect();
    assert_eq!(stored.len(), 1, "both saves survived: {:?}", ids(&stored));
}

#[tokio::test]
async fn sequential_partition_saves_keep_both() {
    let catalog = catalog_over(Arc::new(MemoryStorage::new()));
    catalog
        .save(CategoryKey::Dresses, vec![product("c1", Some(VariantTag::Curvy))])
        .await
        .unwrap();
    let report = catalog
        .save(CategoryKey::Dresses, vec![product("s1", Some(VariantTag::Standard))])
        .await
        .unwrap();
    assert_eq!(ids(&report.products), vec!["s1", "c1"]);
}
