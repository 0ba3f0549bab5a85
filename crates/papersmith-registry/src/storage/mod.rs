//! Template store abstraction
//!
//! A store holds the raw source text of templates, addressed by name. Stores
//! never parse templates and never reject an `add`: duplicate detection is
//! the registry's job, so every backend overwrites unconditionally.

use async_trait::async_trait;

pub mod memory_storage;

pub use memory_storage::MemoryStore;

#[cfg(feature = "s3")]
pub mod s3_storage;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: std::time::Duration,
    },

    #[error("Invalid key format: {0}")]
    InvalidKey(String),

    #[error("Stored template '{0}' is not valid UTF-8")]
    InvalidUtf8(String),
}

/// One entry returned by [`TemplateStore::get_all`]
///
/// Listing is two-phase: backends that already hold the content in hand
/// return it, remote backends only return names and leave `content` empty so
/// the caller fetches what it needs with [`TemplateStore::get_by_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTemplate {
    pub name: String,
    pub content: Option<String>,
}

impl StoredTemplate {
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
        }
    }

    pub fn with_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Some(content.into()),
        }
    }
}

/// Persistence for raw template source text
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fetch the source of `name`
    ///
    /// Absence is not an error: a store with no template under `name`
    /// returns `Ok(None)`. A template stored with empty content returns
    /// `Ok(Some(String::new()))`.
    async fn get_by_name(&self, name: &str) -> Result<Option<String>, StorageError>;

    /// List every stored template
    async fn get_all(&self) -> Result<Vec<StoredTemplate>, StorageError>;

    /// Store `content` under `name`, replacing any previous content
    async fn add(&self, name: &str, content: &str) -> Result<(), StorageError>;

    /// Short identifier used in logs
    fn backend_name(&self) -> &'static str;
}
