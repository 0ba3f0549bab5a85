//! Template registry service
//!
//! [`TemplateRegistry`] is the facade the HTTP layer talks to. It owns the
//! cache and shares the store, and implements the three operations the
//! service needs: existence checks, registration and resolution.

use papersmith::CompiledTemplate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheSettings, TemplateCache};
use crate::error::{RegistryError, Result};
use crate::name::TemplateName;
use crate::storage::TemplateStore;

/// Outcome of [`TemplateRegistry::preload`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub loaded: usize,
    pub failed: Vec<String>,
}

pub struct TemplateRegistry {
    store: Arc<dyn TemplateStore>,
    cache: TemplateCache,
    // Serializes check-and-add so the first registration of a name wins.
    registration: Mutex<()>,
}

impl TemplateRegistry {
    /// Create a registry over `store` with a cache loading from it
    pub fn new(store: Arc<dyn TemplateStore>, settings: CacheSettings) -> Self {
        let cache = TemplateCache::with_store(settings, Arc::clone(&store));
        Self::with_cache(store, cache)
    }

    /// Create a registry with a custom cache
    pub fn with_cache(store: Arc<dyn TemplateStore>, cache: TemplateCache) -> Self {
        Self {
            store,
            cache,
            registration: Mutex::new(()),
        }
    }

    /// Whether a template called `name` exists
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let name = TemplateName::parse(name)?;
        Ok(self.cache.exists(name.as_str()).await?)
    }

    /// Register a new template
    ///
    /// Registering a name that already exists fails with
    /// [`RegistryError::TemplateAlreadyExists`], whatever the new content.
    /// Otherwise the content is compiled and invalid content is rejected
    /// without touching the store. The cache is not populated:
    /// the template is compiled again lazily on first resolution.
    pub async fn register_template(&self, name: &str, content: &str) -> Result<()> {
        let name = TemplateName::parse(name)?;

        let _guard = self.registration.lock().await;

        if self.cache.exists(name.as_str()).await? {
            info!(template = %name, "Template already exists");
            return Err(RegistryError::TemplateAlreadyExists(name.into_inner()));
        }

        CompiledTemplate::compile(name.as_str(), content)?;

        self.store.add(name.as_str(), content).await.map_err(|e| {
            warn!(template = %name, backend = self.store.backend_name(), error = %e, "Failed to store template");
            e
        })?;

        info!(
            template = %name,
            backend = self.store.backend_name(),
            bytes = content.len(),
            "Registered template"
        );
        Ok(())
    }

    /// Resolve a compiled template ready for rendering
    pub async fn resolve_for_rendering(&self, name: &str) -> Result<Arc<CompiledTemplate>> {
        let name = TemplateName::parse(name)?;
        Ok(self.cache.resolve(name.as_str()).await?)
    }

    /// Names of every template in the store
    pub async fn list_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load every stored template into the cache
    ///
    /// Templates that cannot be resolved are logged and reported in
    /// [`PreloadReport::failed`]; only a failure to list the store is an
    /// error. Every listed template is resolved; once the cache is full the
    /// least recently used entries are evicted to make room.
    pub async fn preload(&self) -> Result<PreloadReport> {
        let names = self.list_names().await?;
        let mut report = PreloadReport::default();

        for name in names {
            match self.resolve_for_rendering(&name).await {
                Ok(_) => {
                    debug!(template = %name, "Preloaded template");
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!(template = %name, error = %e, "Failed to preload template");
                    report.failed.push(name);
                }
            }
        }

        info!(
            loaded = report.loaded,
            failed = report.failed.len(),
            "Template preload finished"
        );
        Ok(report)
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("backend", &self.store.backend_name())
            .field("cache", &self.cache)
            .finish()
    }
}
