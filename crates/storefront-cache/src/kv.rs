//! Key-Value store wrapper with automatic serialization.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{de::DeserializeOwned, Serialize};

use crate::CacheError;

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust
/// use storefront_cache::cache_key;
///
/// let key = cache_key!("shop", "cart");
/// assert_eq!(key, "shop:cart");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

enum Backend {
    Memory(RwLock<HashMap<String, Vec<u8>>>),
    Directory(PathBuf),
}

/// Type-safe key-value cache.
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. An optional namespace is prepended to
/// every key, so several stores can share one backend directory.
pub struct Cache {
    backend: Backend,
    namespace: Option<String>,
}

impl Cache {
    /// Create a cache that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(HashMap::new())),
            namespace: None,
        }
    }

    /// Open a directory-backed cache, creating the directory if needed.
    ///
    /// Each key is stored as its own JSON file.
    pub fn open_dir(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        fs::create_dir_all(path)
            .map_err(|e| CacheError::OpenError(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(dir = %path.display(), "opened directory cache");
        Ok(Self {
            backend: Backend::Directory(path.to_path_buf()),
            namespace: None,
        })
    }

    /// Prefix every key with a namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_bytes(&self.full_key(key))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.set_bytes(&self.full_key(key), bytes)
    }

    fn full_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(ns) => cache_key!(ns.as_str(), key),
            None => key.to_string(),
        }
    }

    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match &self.backend {
            Backend::Memory(map) => Ok(map.read().map_err(poisoned)?.get(key).cloned()),
            Backend::Directory(dir) => match fs::read(file_for(dir, key)) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }

    fn set_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError> {
        match &self.backend {
            Backend::Memory(map) => {
                map.write().map_err(poisoned)?.insert(key.to_string(), bytes);
                Ok(())
            }
            Backend::Directory(dir) => {
                // Write-then-rename so readers never see a half-written file.
                let target = file_for(dir, key);
                let tmp = target.with_extension("json.tmp");
                fs::write(&tmp, &bytes)?;
                fs::rename(&tmp, &target)?;
                tracing::trace!(key, bytes = bytes.len(), "wrote cache entry");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match &self.backend {
            Backend::Memory(_) => "memory".to_string(),
            Backend::Directory(dir) => dir.display().to_string(),
        };
        f.debug_struct("Cache")
            .field("backend", &backend)
            .field("namespace", &self.namespace)
            .finish()
    }
}

fn file_for(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", URL_SAFE_NO_PAD.encode(key.as_bytes())))
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> CacheError {
    CacheError::StoreError("lock poisoned".to_string())
}
