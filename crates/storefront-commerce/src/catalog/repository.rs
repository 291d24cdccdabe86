//! Product repository.
//!
//! Holds the current catalog as an immutable, versioned snapshot. Readers
//! clone the `Arc` and work against one consistent version; writers build a
//! new snapshot and swap it in under a short write lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::product::{Product, VariantSelection};
use crate::error::CommerceError;
use crate::persist::{self, Persister, PRODUCTS_KEY};
use crate::resolver::{self, ResolvedConfiguration};

/// Something that can deliver the full product list.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Product>, CommerceError>;
}

/// A product source backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticProductSource {
    products: Vec<Product>,
    failure: Option<String>,
}

impl StaticProductSource {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            failure: None,
        }
    }

    /// A source whose every fetch fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            products: Vec::new(),
            failure: Some(message.into()),
        }
    }

    /// The bundled demo catalog: four burger menu items and a jersey with
    /// sizes, colors and flocking.
    pub fn demo() -> Result<Self, CommerceError> {
        let products: Vec<Product> = serde_json::from_str(include_str!("demo_catalog.json"))?;
        Ok(Self::new(products))
    }
}

#[async_trait]
impl ProductSource for StaticProductSource {
    async fn fetch(&self) -> Result<Vec<Product>, CommerceError> {
        match &self.failure {
            Some(message) => Err(CommerceError::SourceUnavailable(message.clone())),
            None => Ok(self.products.clone()),
        }
    }
}

/// One immutable version of the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Bumped on every swap.
    pub version: u64,
    pub products: Vec<Product>,
}

impl CatalogSnapshot {
    /// Look up a product by its base SKU.
    pub fn get(&self, sku: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.sku.as_str() == sku)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Shared, refreshable product catalog.
#[derive(Debug, Default)]
pub struct ProductRepository {
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    /// Number of refreshes in flight.
    loading: AtomicUsize,
    last_error: RwLock<Option<String>>,
}

impl ProductRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository pre-filled with `products`.
    pub fn with_products(products: Vec<Product>) -> Self {
        let repository = Self::new();
        repository.replace(products);
        repository
    }

    /// Rehydrate from persisted state; missing or unreadable state yields an
    /// empty catalog.
    pub fn load(persister: &dyn Persister) -> Self {
        let products: Vec<Product> = persist::load_or_default(persister, PRODUCTS_KEY);
        tracing::debug!(count = products.len(), "loaded persisted catalog");
        Self::with_products(products)
    }

    /// Persist the current product list.
    pub fn save(&self, persister: &dyn Persister) -> Result<(), CommerceError> {
        let snapshot = self.snapshot();
        persist::save_as(persister, PRODUCTS_KEY, &snapshot.products)
    }

    /// The current catalog version.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A copy of every product.
    pub fn products(&self) -> Vec<Product> {
        self.snapshot().products.clone()
    }

    pub fn get_product(&self, sku: &str) -> Option<Product> {
        self.snapshot().get(sku).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Whether any refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire) > 0
    }

    /// Message of the most recent failed refresh, cleared by the next swap.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new product list. Invalid products are logged and skipped.
    ///
    /// Returns the number of products kept.
    pub fn replace(&self, products: Vec<Product>) -> usize {
        let products: Vec<Product> = products
            .into_iter()
            .filter(|product| match product.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(sku = %product.sku, error = %e, "skipping invalid product");
                    false
                }
            })
            .collect();
        let count = products.len();

        let version = {
            let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            let version = guard.version + 1;
            *guard = Arc::new(CatalogSnapshot { version, products });
            version
        };
        self.set_last_error(None);

        tracing::info!(version, count, "catalog snapshot replaced");
        count
    }

    /// Fetch from `source` and swap the result in.
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// recorded in [`last_error`](Self::last_error).
    pub async fn refresh(&self, source: &dyn ProductSource) -> Result<usize, CommerceError> {
        let _loading = LoadingGuard::start(&self.loading);
        tracing::debug!("refreshing catalog");

        match source.fetch().await {
            Ok(products) => Ok(self.replace(products)),
            Err(e) => {
                let message = match e {
                    CommerceError::SourceUnavailable(message) => message,
                    other => other.to_string(),
                };
                tracing::warn!(error = %message, "catalog refresh failed; keeping previous snapshot");
                self.set_last_error(Some(message.clone()));
                Err(CommerceError::SourceUnavailable(message))
            }
        }
    }

    /// Fetch only when no products are held yet.
    pub async fn load_if_empty(&self, source: &dyn ProductSource) -> Result<usize, CommerceError> {
        let current = self.snapshot();
        if !current.is_empty() {
            return Ok(current.len());
        }
        self.refresh(source).await
    }

    /// Resolve a selection against the product with base SKU `sku`.
    pub fn resolve(
        &self,
        sku: &str,
        selection: &VariantSelection,
    ) -> Result<ResolvedConfiguration, CommerceError> {
        let snapshot = self.snapshot();
        let product = snapshot
            .get(sku)
            .ok_or_else(|| CommerceError::ProductNotFound(sku.to_string()))?;
        Ok(resolver::resolve(product, selection))
    }

    /// Take `quantity` units off the stock of a variant or simple product,
    /// saturating at zero.
    pub fn decrement_stock(&self, sku: &str, quantity: u32) -> Result<(), CommerceError> {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let mut products = guard.products.clone();

        let variant_at = products.iter().enumerate().find_map(|(i, p)| {
            p.variants
                .iter()
                .position(|v| v.sku.as_str() == sku)
                .map(|j| (i, j))
        });
        let stock = match variant_at {
            Some((i, j)) => &mut products[i].variants[j].stock_level,
            None => {
                let product = products
                    .iter_mut()
                    .find(|p| p.sku.as_str() == sku)
                    .ok_or_else(|| CommerceError::ProductNotFound(sku.to_string()))?;
                &mut product.stock_level
            }
        };
        *stock = stock.saturating_sub(quantity);
        let remaining = *stock;

        let version = guard.version + 1;
        *guard = Arc::new(CatalogSnapshot { version, products });
        tracing::debug!(sku, quantity, remaining, version, "stock decremented");
        Ok(())
    }

    fn set_last_error(&self, message: Option<String>) {
        *self.last_error.write().unwrap_or_else(PoisonError::into_inner) = message;
    }
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn start(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::AcqRel);
        Self(in_flight)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VariantCombination;
    use crate::money::Money;
    use std::cell::Cell;
    use tokio::sync::Notify;

    /// Holds `fetch` until [`open`](Self::open) is called.
    struct GatedSource {
        products: Vec<Product>,
        gate: Notify,
    }

    impl GatedSource {
        fn new(products: Vec<Product>) -> Self {
            Self {
                products,
                gate: Notify::new(),
            }
        }

        fn open(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait]
    impl ProductSource for GatedSource {
        async fn fetch(&self) -> Result<Vec<Product>, CommerceError> {
            self.gate.notified().await;
            Ok(self.products.clone())
        }
    }

    fn burgers() -> Vec<Product> {
        vec![
            Product::new("BIG-MAC", "Big Mac", Money::new(499)).with_stock(10),
            Product::new("FRIES", "French Fries", Money::new(299)).with_stock(15),
        ]
    }

    fn shirt() -> Product {
        Product::new("SHIRT", "Shirt", Money::new(2000))
            .with_attribute("Size", &["S", "M"])
            .with_variant(VariantCombination::new("SHIRT-S", &[("Size", "S")], 4))
            .with_variant(VariantCombination::new("SHIRT-M", &[("Size", "M")], 1))
    }

    #[test]
    fn test_replace_bumps_version() {
        let repository = ProductRepository::new();
        assert_eq!(repository.snapshot().version, 0);

        assert_eq!(repository.replace(burgers()), 2);
        assert_eq!(repository.snapshot().version, 1);
        assert!(repository.get_product("FRIES").is_some());
        assert!(repository.get_product("NOPE").is_none());
    }

    #[test]
    fn test_invalid_products_are_skipped() {
        let mut broken = shirt();
        broken.sku = "BROKEN".into();
        broken.variants.clear();

        let repository = ProductRepository::with_products(vec![shirt(), broken]);
        assert_eq!(repository.products().len(), 1);
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let repository = ProductRepository::with_products(burgers());
        let before = repository.snapshot();

        repository.replace(vec![shirt()]);
        assert_eq!(before.len(), 2);
        assert_eq!(repository.snapshot().len(), 1);
    }

    #[test]
    fn test_decrement_stock_variant_and_simple() {
        let mut products = burgers();
        products.push(shirt());
        let repository = ProductRepository::with_products(products);

        repository.decrement_stock("SHIRT-S", 3).unwrap();
        repository.decrement_stock("FRIES", 20).unwrap();

        let shirt = repository.get_product("SHIRT").unwrap();
        assert_eq!(shirt.variants[0].stock_level, 1);
        assert_eq!(repository.get_product("FRIES").unwrap().stock_level, 0);

        assert!(matches!(
            repository.decrement_stock("GHOST", 1),
            Err(CommerceError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_by_sku() {
        let repository = ProductRepository::with_products(vec![shirt()]);
        let selection: VariantSelection = [("Size".to_string(), "M".to_string())].into();

        let resolved = repository.resolve("SHIRT", &selection).unwrap();
        assert_eq!(resolved.sku.as_str(), "SHIRT-M");
        assert!(repository.resolve("NOPE", &selection).is_err());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_snapshot() {
        let repository = ProductRepository::with_products(burgers());
        let version = repository.snapshot().version;

        let result = repository
            .refresh(&StaticProductSource::failing("backend down"))
            .await;
        assert!(matches!(result, Err(CommerceError::SourceUnavailable(_))));
        assert_eq!(repository.snapshot().version, version);
        assert_eq!(repository.products().len(), 2);
        assert_eq!(repository.last_error().as_deref(), Some("backend down"));
        assert!(!repository.is_loading());

        repository
            .refresh(&StaticProductSource::new(vec![shirt()]))
            .await
            .unwrap();
        assert!(repository.last_error().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_keep_loading_until_last_finishes() {
        let repository = ProductRepository::new();
        let first = GatedSource::new(burgers());
        let second = GatedSource::new(vec![shirt()]);
        let first_done = Cell::new(false);

        let run_first = async {
            let result = repository.refresh(&first).await;
            first_done.set(true);
            result
        };
        let drive = async {
            tokio::task::yield_now().await;
            assert!(repository.is_loading());
            first.open();
            while !first_done.get() {
                tokio::task::yield_now().await;
            }
            assert!(repository.is_loading());
            second.open();
        };

        let (a, b, ()) = tokio::join!(run_first, repository.refresh(&second), drive);
        assert_eq!(a.unwrap(), 2);
        assert_eq!(b.unwrap(), 1);
        assert!(!repository.is_loading());
        assert!(repository.get_product("SHIRT").is_some());
    }

    #[tokio::test]
    async fn test_load_if_empty_only_fetches_once() {
        let repository = ProductRepository::new();
        let count = repository
            .load_if_empty(&StaticProductSource::new(burgers()))
            .await
            .unwrap();
        assert_eq!(count, 2);

        let count = repository
            .load_if_empty(&StaticProductSource::new(vec![shirt()]))
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert!(repository.get_product("SHIRT").is_none());
    }

    #[tokio::test]
    async fn test_demo_catalog_parses() {
        let source = StaticProductSource::demo().unwrap();
        let repository = ProductRepository::new();
        assert_eq!(repository.refresh(&source).await.unwrap(), 5);

        let jersey = repository.get_product("JERSEY-HOME").unwrap();
        assert!(jersey.has_variants);
        assert_eq!(jersey.customizations().len(), 2);
    }
}
