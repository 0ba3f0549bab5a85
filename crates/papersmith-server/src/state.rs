//! Application state and its construction from settings

use papersmith::{DocumentRenderer, WkHtmlToPdf};
use papersmith_registry::{
    CacheSettings, MemoryStore, ObjectStoreSettings, RegistryError, S3Store, TemplateRegistry,
    TemplateStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Settings, StorageType};
use crate::error::Result;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TemplateRegistry>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    pub fn new(registry: Arc<TemplateRegistry>, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { registry, renderer }
    }

    /// Build the store, registry and renderer described by `settings`
    ///
    /// Fails before the server accepts any request if the storage backend
    /// cannot be set up.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let store = build_store(settings).await?;
        let registry = Arc::new(TemplateRegistry::new(
            store,
            CacheSettings::from(&settings.cache),
        ));

        if settings.template.preload {
            let report = registry.preload().await?;
            if !report.failed.is_empty() {
                warn!(failed = ?report.failed, "Some templates could not be preloaded");
            }
        }

        let renderer = WkHtmlToPdf::new(settings.renderer.binary.clone())
            .with_args(settings.renderer.args.clone())
            .with_timeout(Duration::from_secs(settings.renderer.timeout_seconds));

        Ok(Self::new(registry, Arc::new(renderer)))
    }
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn TemplateStore>> {
    match settings.storage.kind {
        StorageType::InMemory => {
            info!("Using in-memory template store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageType::ObjectStore => {
            let minio = &settings.storage.minio;
            let store = S3Store::new(&ObjectStoreSettings {
                endpoint: minio.endpoint.clone(),
                access_key: minio.access_key.clone(),
                secret_key: minio.secret_key.clone(),
                use_ssl: minio.use_ssl,
                bucket: minio.bucket.clone(),
                region: minio.region.clone(),
                prefix: minio.path.clone(),
                timeout: Duration::from_secs(minio.timeout_seconds),
            })
            .map_err(RegistryError::from)?;

            if minio.create_bucket {
                store.ensure_bucket().await.map_err(RegistryError::from)?;
            }

            Ok(Arc::new(store))
        }
    }
}
