//! Type-safe key-value store for storefront state.
//!
//! Values are stored as JSON documents, either in memory or as one file per
//! key inside a directory.
//!
//! # Example
//!
//! ```rust
//! use storefront_cache::Cache;
//!
//! let cache = Cache::in_memory().with_namespace("shop");
//! cache.set("cart", &vec![1, 2, 3]).unwrap();
//!
//! let cart: Option<Vec<i32>> = cache.get("cart").unwrap();
//! assert_eq!(cart, Some(vec![1, 2, 3]));
//! ```

mod error;
mod kv;

pub use error::CacheError;
pub use kv::Cache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError};
}
