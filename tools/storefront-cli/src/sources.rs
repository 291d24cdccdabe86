//! File-backed product source and order sink.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use storefront_commerce::catalog::{Product, ProductSource};
use storefront_commerce::checkout::{OrderConfirmation, OrderSink, OrderSubmission};
use storefront_commerce::{CommerceError, OrderNumber};

/// Catalog file layout: a bare array or an object with a `products` list.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<Product>),
    Wrapped { products: Vec<Product> },
}

/// Reads the catalog from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileProductSource {
    path: PathBuf,
}

impl FileProductSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProductSource for FileProductSource {
    async fn fetch(&self) -> Result<Vec<Product>, CommerceError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CommerceError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let catalog: CatalogFile = serde_json::from_str(&content).map_err(|e| {
            CommerceError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(match catalog {
            CatalogFile::List(products) | CatalogFile::Wrapped { products } => products,
        })
    }
}

/// A placed order as written to disk.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord<'a> {
    order_number: &'a OrderNumber,
    placed_at: String,
    #[serde(flatten)]
    order: &'a OrderSubmission,
}

/// Accepts every order and writes it to `<dir>/<order number>.json`.
#[derive(Debug, Clone)]
pub struct LocalOrderSink {
    dir: PathBuf,
}

impl LocalOrderSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl OrderSink for LocalOrderSink {
    async fn submit(&self, order: &OrderSubmission) -> Result<OrderConfirmation, CommerceError> {
        let order_number = OrderNumber::generate();
        let record = OrderRecord {
            order_number: &order_number,
            placed_at: Utc::now().to_rfc3339(),
            order,
        };
        let json = serde_json::to_vec_pretty(&record)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CommerceError::OrderRejected(e.to_string()))?;
        let path = self.dir.join(format!("{}.json", order_number));
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| CommerceError::OrderRejected(e.to_string()))?;

        tracing::debug!(path = %path.display(), "order written");
        Ok(OrderConfirmation { order_number })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_commerce::checkout::{Customer, PaymentMethod};
    use storefront_commerce::Money;

    #[tokio::test]
    async fn test_file_source_accepts_both_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.json");
        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&list, r#"[{"sku": "FRIES", "name": "Fries", "price": 2.99, "stockLevel": 3}]"#)
            .unwrap();
        std::fs::write(
            &wrapped,
            r#"{"products": [{"sku": "COLA", "name": "Cola", "price": 1.5}]}"#,
        )
        .unwrap();

        let products = FileProductSource::new(&list).fetch().await.unwrap();
        assert_eq!(products[0].sku.as_str(), "FRIES");
        assert_eq!(products[0].stock_level, 3);

        let products = FileProductSource::new(&wrapped).fetch().await.unwrap();
        assert_eq!(products[0].price, Money::new(150));
    }

    #[tokio::test]
    async fn test_file_source_errors_are_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileProductSource::new(dir.path().join("missing.json"));
        assert!(matches!(
            missing.fetch().await,
            Err(CommerceError::SourceUnavailable(_))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(matches!(
            FileProductSource::new(&broken).fetch().await,
            Err(CommerceError::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fixture_catalog_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/catalog.json");
        let products = FileProductSource::new(path).fetch().await.unwrap();

        assert_eq!(products.len(), 2);
        for product in &products {
            product.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_local_sink_writes_order_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalOrderSink::new(dir.path().join("orders"));
        let order = OrderSubmission {
            items: Vec::new(),
            customer: Customer::sample(0),
            payment_method: PaymentMethod::PayInStore,
            total_price: Money::new(499),
        };

        let confirmation = sink.submit(&order).await.unwrap();
        let path = sink.dir().join(format!("{}.json", confirmation.order_number));
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(written["orderNumber"], confirmation.order_number.as_str());
        assert_eq!(written["paymentMethod"], "pay_in_store");
        assert_eq!(written["totalPrice"], 4.99);
        assert!(written["placedAt"].as_str().is_some());
    }
}
