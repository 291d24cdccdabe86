//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use storefront_cache::Cache;
use storefront_commerce::catalog::{ProductRepository, ProductSource, StaticProductSource};

use crate::config::{StorefrontConfig, CONFIG_FILE_NAMES};
use crate::output::Output;
use crate::sources::{FileProductSource, LocalOrderSink};

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: StorefrontConfig,
    /// Config file the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => (StorefrontConfig::load(path)?, Some(PathBuf::from(path))),
            None => match find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (StorefrontConfig::default(), None),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Open the persistent store holding the catalog snapshot and the cart.
    pub fn open_store(&self) -> Result<Cache> {
        let dir = self.resolve_path(&self.config.storage.dir);
        let store = Cache::open_dir(&dir)
            .with_context(|| format!("Failed to open storage directory {}", dir.display()))?;
        Ok(match &self.config.storage.namespace {
            Some(namespace) => store.with_namespace(namespace.clone()),
            None => store,
        })
    }

    /// The configured product source.
    pub fn product_source(&self) -> Result<Box<dyn ProductSource>> {
        match &self.config.catalog.path {
            Some(path) => Ok(Box::new(FileProductSource::new(self.resolve_path(path)))),
            None => Ok(Box::new(
                StaticProductSource::demo().context("Bundled demo catalog is unreadable")?,
            )),
        }
    }

    /// Where confirmed orders are written.
    pub fn order_sink(&self) -> LocalOrderSink {
        LocalOrderSink::new(self.resolve_path(&self.config.storage.dir).join("orders"))
    }

    /// Rehydrate the repository, fetching the catalog when nothing is
    /// persisted yet.
    pub async fn load_repository(&self, store: &Cache) -> Result<ProductRepository> {
        let repository = ProductRepository::load(store);
        if repository.is_empty() {
            let spinner = self.output.spinner("Loading catalog...");
            let source = self.product_source()?;
            let loaded = repository.load_if_empty(source.as_ref()).await;
            spinner.finish_and_clear();

            let count = loaded.context("Failed to load catalog")?;
            self.output.debug(&format!("Fetched {} products", count));
            repository.save(store)?;
        }
        Ok(repository)
    }
}

/// Find config file in directory tree.
fn find_config(start: &Path) -> Option<(StorefrontConfig, PathBuf)> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                if let Ok(config) = StorefrontConfig::load(config_path.to_str()?) {
                    return Some((config, config_path));
                }
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}
