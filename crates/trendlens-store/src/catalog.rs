//! Process-wide cache of every category's product list.
//!
//! The cache starts empty for every category, is filled by explicit loads,
//! updated immediately after successful saves and kept fresh by
//! subscriptions. A failed load or save leaves the cached list as it was.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use trendlens_core::{CategoryKey, Product};

use crate::chunked::{ChunkedStore, SaveReport};
use crate::error::StoreError;
use crate::subscription::Subscription;

type Cache = Arc<RwLock<HashMap<CategoryKey, Vec<Product>>>>;

#[derive(Clone)]
pub struct Catalog {
    store: ChunkedStore,
    cache: Cache,
}

impl Catalog {
    #[must_use]
    pub fn new(store: ChunkedStore) -> Self {
        let cache = CategoryKey::ALL
            .iter()
            .map(|&category| (category, Vec::new()))
            .collect();
        Self {
            store,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    #[must_use]
    pub fn store(&self) -> &ChunkedStore {
        &self.store
    }

    /// The cached list of `category`.
    #[must_use]
    pub fn products(&self, category: CategoryKey) -> Vec<Product> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    /// Loads `category` from storage into the cache.
    ///
    /// # Errors
    ///
    /// Propagates storage failures; the cached list is left unchanged.
    pub async fn load(&self, category: CategoryKey) -> Result<Vec<Product>, StoreError> {
        let products = self.store.load_category(category).await?;
        replace(&self.cache, category, products.clone());
        Ok(products)
    }

    /// Loads every category concurrently and reports the per-category
    /// product count or error.
    pub async fn load_all(&self) -> Vec<(CategoryKey, Result<usize, StoreError>)> {
        join_all(CategoryKey::ALL.iter().map(|&category| async move {
            let result = self.load(category).await.map(|products| products.len());
            if let Err(e) = &result {
                tracing::warn!(%category, error = %e, "failed to load category");
            }
            (category, result)
        }))
        .await
    }

    /// Saves through the chunked store and, on success, replaces the cached
    /// list with the stored result.
    ///
    /// # Errors
    ///
    /// Propagates save failures; the cached list is left unchanged.
    pub async fn save(
        &self,
        category: CategoryKey,
        incoming: Vec<Product>,
    ) -> Result<SaveReport, StoreError> {
        match self.store.save_category(category, incoming).await {
            Ok(report) => {
                replace(&self.cache, category, report.products.clone());
                Ok(report)
            }
            Err(e) => {
                tracing::error!(%category, error = %e, "save failed, keeping cached list");
                Err(e)
            }
        }
    }

    /// Keeps the cached list of `category` in sync with storage and passes
    /// every delivered list to `on_change` after the cache is updated.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend refuses the watch.
    pub fn subscribe<F>(
        &self,
        category: CategoryKey,
        mut on_change: F,
    ) -> Result<Subscription, StoreError>
    where
        F: FnMut(&[Product]) + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        self.store.subscribe(category, move |products| {
            replace(&cache, category, products.clone());
            on_change(&products);
        })
    }

    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&CategoryKey::Favorites)
            .is_some_and(|favorites| favorites.iter().any(|p| p.id == id))
    }

    /// Appends `product` to favorites. Returns `false` when it already was
    /// one.
    ///
    /// Favorites are reloaded from storage first, so a cold cache never
    /// drops stored entries.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    pub async fn add_favorite(&self, product: Product) -> Result<bool, StoreError> {
        let favorites = self.load(CategoryKey::Favorites).await?;
        if favorites.iter().any(|p| p.id == product.id) {
            return Ok(false);
        }
        self.push_favorite(favorites, product).await?;
        Ok(true)
    }

    /// Removes every favorite with `id`. Returns `false` when there was none.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    pub async fn remove_favorite(&self, id: &str) -> Result<bool, StoreError> {
        let favorites = self.load(CategoryKey::Favorites).await?;
        self.drop_favorite(favorites, id).await
    }

    /// Adds or removes `product`. Returns whether it is a favorite now.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    pub async fn toggle_favorite(&self, product: Product) -> Result<bool, StoreError> {
        let favorites = self.load(CategoryKey::Favorites).await?;
        if favorites.iter().any(|p| p.id == product.id) {
            self.drop_favorite(favorites, &product.id).await?;
            Ok(false)
        } else {
            self.push_favorite(favorites, product).await?;
            Ok(true)
        }
    }

    async fn push_favorite(
        &self,
        mut favorites: Vec<Product>,
        product: Product,
    ) -> Result<(), StoreError> {
        favorites.push(product);
        self.save_favorites(favorites).await
    }

    async fn drop_favorite(
        &self,
        mut favorites: Vec<Product>,
        id: &str,
    ) -> Result<bool, StoreError> {
        let before = favorites.len();
        favorites.retain(|p| p.id != id);
        if favorites.len() == before {
            return Ok(false);
        }
        self.save_favorites(favorites).await?;
        Ok(true)
    }

    // Favorites are saved untagged so every save is a full replace.
    async fn save_favorites(&self, mut favorites: Vec<Product>) -> Result<(), StoreError> {
        for product in &mut favorites {
            product.variant_tag = None;
        }
        self.save(CategoryKey::Favorites, favorites).await?;
        Ok(())
    }
}

fn replace(cache: &Cache, category: CategoryKey, products: Vec<Product>) {
    cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(category, products);
}
