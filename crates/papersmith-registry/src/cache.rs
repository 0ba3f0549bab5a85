//! Template cache
//!
//! Compiled templates are kept in a bounded, time-expiring cache keyed by
//! template name. A miss runs the loader supplied at construction, which
//! normally falls through to the [`TemplateStore`] and compiles the result.
//!
//! - Capacity: least-recently-used entries are discarded once `max_capacity`
//!   is exceeded.
//! - Expiry: every entry expires `time_to_live` after insertion, regardless of
//!   how often it is read.
//! - Loads for the same key are coalesced, so concurrent misses share one
//!   store read. Failed loads are never cached.

use futures_util::future::BoxFuture;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use papersmith::CompiledTemplate;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::{StorageError, TemplateStore};

/// Failure to produce a compiled template for a name
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template store unavailable while loading '{name}': {source}")]
    StoreUnavailable {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("Template '{name}' is invalid: {message}")]
    TemplateInvalid { name: String, message: String },
}

/// Loads and compiles a template on a cache miss
pub type TemplateLoader =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<Arc<CompiledTemplate>, CacheError>> + Send + Sync>;

/// Cache bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_capacity: u64,
    pub time_to_live: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 100,
            time_to_live: Duration::from_secs(600),
        }
    }
}

#[derive(Clone)]
pub struct TemplateCache {
    cache: Cache<String, Arc<CompiledTemplate>>,
    loader: TemplateLoader,
    settings: CacheSettings,
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("max_capacity", &self.settings.max_capacity)
            .field("time_to_live", &self.settings.time_to_live)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl TemplateCache {
    /// Create a cache that runs `loader` on every miss
    pub fn new(settings: CacheSettings, loader: TemplateLoader) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.max_capacity)
            .time_to_live(settings.time_to_live)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        debug!(
            max_capacity = settings.max_capacity,
            ttl_seconds = settings.time_to_live.as_secs(),
            "Template cache created"
        );

        Self {
            cache,
            loader,
            settings,
        }
    }

    /// Create a cache whose loader reads from `store` and compiles the source
    pub fn with_store(settings: CacheSettings, store: Arc<dyn TemplateStore>) -> Self {
        Self::new(settings, store_loader(store))
    }

    /// Return the compiled template for `name`, loading it on a miss
    pub async fn resolve(&self, name: &str) -> Result<Arc<CompiledTemplate>, CacheError> {
        if let Some(template) = self.cache.get(name).await {
            debug!(template = name, "Cache HIT");
            return Ok(template);
        }

        debug!(template = name, "Cache MISS");
        self.cache
            .try_get_with(name.to_string(), (self.loader)(name.to_string()))
            .await
            .map_err(|e| e.as_ref().clone())
    }

    /// Whether a template called `name` exists
    ///
    /// Goes through [`resolve`](Self::resolve), so a positive answer also warms
    /// the cache. A template whose stored source fails to compile still
    /// exists. Store failures are returned rather than reported as absence,
    /// so a backend outage never looks like a free name.
    pub async fn exists(&self, name: &str) -> Result<bool, CacheError> {
        match self.resolve(name).await {
            Ok(_) => Ok(true),
            Err(CacheError::TemplateNotFound(_)) => Ok(false),
            Err(CacheError::TemplateInvalid { .. }) => Ok(true),
            Err(e @ CacheError::StoreUnavailable { .. }) => Err(e),
        }
    }

    /// Whether `name` is currently held in the cache
    pub fn contains(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Drop `name` from the cache; the next resolve reloads it
    pub async fn invalidate(&self, name: &str) {
        self.cache.invalidate(name).await;
    }

    /// Approximate number of cached templates
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Apply pending evictions and expirations immediately
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }
}

/// Loader falling through to `store`
pub fn store_loader(store: Arc<dyn TemplateStore>) -> TemplateLoader {
    Arc::new(move |name: String| {
        let store = Arc::clone(&store);
        Box::pin(async move { load_from_store(store.as_ref(), name).await })
    })
}

async fn load_from_store(
    store: &dyn TemplateStore,
    name: String,
) -> Result<Arc<CompiledTemplate>, CacheError> {
    let source = match store.get_by_name(&name).await {
        Ok(Some(source)) => source,
        Ok(None) => return Err(CacheError::TemplateNotFound(name)),
        Err(source) => {
            warn!(
                template = %name,
                backend = store.backend_name(),
                error = %source,
                "Failed to load template from store"
            );
            return Err(CacheError::StoreUnavailable { name, source });
        }
    };

    let compiled = CompiledTemplate::compile(name.as_str(), source).map_err(|e| {
        warn!(template = %name, error = %e, "Stored template failed to compile");
        CacheError::TemplateInvalid {
            name: name.clone(),
            message: e.to_string(),
        }
    })?;

    debug!(template = %name, backend = store.backend_name(), "Loaded template from store");
    Ok(Arc::new(compiled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_loader(calls: Arc<AtomicUsize>) -> TemplateLoader {
        Arc::new(move |name: String| {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                CompiledTemplate::compile(name.as_str(), "Hi {{who}}")
                    .map(Arc::new)
                    .map_err(|e| CacheError::TemplateInvalid {
                        name,
                        message: e.to_string(),
                    })
            })
        })
    }

    #[tokio::test]
    async fn test_hit_skips_loader() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TemplateCache::new(CacheSettings::default(), counting_loader(calls.clone()));

        let first = cache.resolve("greeting").await.unwrap();
        let second = cache.resolve("greeting").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("greeting"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = TemplateCache::new(CacheSettings::default(), counting_loader(calls.clone()));

        cache.resolve("greeting").await.unwrap();
        cache.invalidate("greeting").await;
        assert!(!cache.contains("greeting"));

        cache.resolve("greeting").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_loader_maps_absence() {
        let store: Arc<dyn TemplateStore> = Arc::new(MemoryStore::new());
        let cache = TemplateCache::with_store(CacheSettings::default(), store);

        assert!(matches!(
            cache.resolve("missing").await,
            Err(CacheError::TemplateNotFound(name)) if name == "missing"
        ));
        assert!(!cache.exists("missing").await.unwrap());
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_template_is_not_cached() {
        let store = Arc::new(MemoryStore::with_templates([("broken", "{{#if x}}{{/each}}")]));
        let cache = TemplateCache::with_store(CacheSettings::default(), store.clone());

        assert!(matches!(
            cache.resolve("broken").await,
            Err(CacheError::TemplateInvalid { .. })
        ));
        assert!(cache.exists("broken").await.unwrap());

        // Fixing the stored source is picked up without any eviction.
        store.add("broken", "{{#if x}}yes{{/if}}").await.unwrap();
        let fixed = cache.resolve("broken").await.unwrap();
        assert_eq!(fixed.render(&json!({ "x": true })).unwrap(), "yes");
    }
}
