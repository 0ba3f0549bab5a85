//! # Papersmith Registry
//!
//! Storage and caching for named HTML templates:
//! - [`TemplateStore`] persists raw template source, in memory or in an
//!   S3-compatible bucket
//! - [`TemplateCache`] holds compiled templates, bounded by size and age,
//!   loading from the store on a miss
//! - [`TemplateRegistry`] coordinates duplicate checks, registration and
//!   resolution for the HTTP layer
//!
//! ## Example Usage
//!
//! ```rust
//! use papersmith_registry::{CacheSettings, MemoryStore, TemplateRegistry};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = TemplateRegistry::new(Arc::new(MemoryStore::new()), CacheSettings::default());
//!
//! registry.register_template("invoice", "Hello {{Name}}").await?;
//!
//! let template = registry.resolve_for_rendering("invoice").await?;
//! let html = template.render(&serde_json::json!({ "Name": "Ada" }))?;
//! assert_eq!(html, "Hello Ada");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod name;
pub mod registry;
pub mod storage;

pub use cache::{CacheError, CacheSettings, TemplateCache};
pub use error::{RegistryError, Result};
pub use name::TemplateName;
pub use registry::{PreloadReport, TemplateRegistry};
pub use storage::{MemoryStore, StorageError, StoredTemplate, TemplateStore};

#[cfg(feature = "s3")]
pub use storage::s3_storage::{ObjectStoreSettings, S3Store};
