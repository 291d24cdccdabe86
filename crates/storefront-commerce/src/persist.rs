//! Persistence seam.
//!
//! The repository and the cart ledger store themselves as JSON documents
//! under fixed keys. Any key-value store that can hold a `serde_json::Value`
//! per key can back them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CommerceError;

/// Key holding the product catalog.
pub const PRODUCTS_KEY: &str = "products";
/// Key holding the cart line items.
pub const CART_KEY: &str = "cart";

/// Opaque key-value storage for JSON documents.
pub trait Persister {
    /// Read the document stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Value>, CommerceError>;

    /// Store `value` under `key`, replacing what was there.
    fn save(&self, key: &str, value: &Value) -> Result<(), CommerceError>;
}

#[cfg(feature = "storage")]
impl Persister for storefront_cache::Cache {
    fn load(&self, key: &str) -> Result<Option<Value>, CommerceError> {
        Ok(self.get(key)?)
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), CommerceError> {
        Ok(self.set(key, value)?)
    }
}

/// Read and decode `key`, falling back to the default when the document is
/// missing or unreadable.
pub(crate) fn load_or_default<T>(persister: &dyn Persister, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match persister.load(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable persisted state");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to load persisted state");
            T::default()
        }
    }
}

/// Encode and store `value` under `key`.
pub(crate) fn save_as<T>(persister: &dyn Persister, key: &str, value: &T) -> Result<(), CommerceError>
where
    T: Serialize + ?Sized,
{
    let document = serde_json::to_value(value)?;
    persister.save(key, &document)?;
    tracing::debug!(key, "persisted state");
    Ok(())
}
