//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in storefront operations.
///
/// Resolver misses and rejected cart mutations are not errors; they are
/// reported through fallback values and boolean results instead.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product definition violates a catalog invariant.
    #[error("Invalid product {sku}: {reason}")]
    InvalidProduct { sku: String, reason: String },

    /// User input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The product source could not deliver a catalog.
    #[error("Product source unavailable: {0}")]
    SourceUnavailable(String),

    /// The order sink refused or failed to accept an order.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Persistence backend error.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}

#[cfg(feature = "storage")]
impl From<storefront_cache::CacheError> for CommerceError {
    fn from(e: storefront_cache::CacheError) -> Self {
        CommerceError::Persistence(e.to_string())
    }
}
