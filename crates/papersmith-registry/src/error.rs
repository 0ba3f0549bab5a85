//! Error types for the papersmith registry

use thiserror::Error;

use crate::cache::CacheError;
use crate::storage::StorageError;

/// Registry-level errors returned to the HTTP layer
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template already exists: {0}")]
    TemplateAlreadyExists(String),

    #[error("Invalid template '{name}': {message}")]
    InvalidContent { name: String, message: String },

    #[error("Invalid template name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Template store unavailable: {0}")]
    BackendUnavailable(#[from] StorageError),
}

impl From<CacheError> for RegistryError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::TemplateNotFound(name) => RegistryError::TemplateNotFound(name),
            CacheError::TemplateInvalid { name, message } => {
                RegistryError::InvalidContent { name, message }
            }
            CacheError::StoreUnavailable { source, .. } => RegistryError::BackendUnavailable(source),
        }
    }
}

impl From<papersmith::TemplateError> for RegistryError {
    fn from(err: papersmith::TemplateError) -> Self {
        RegistryError::InvalidContent {
            name: err.template_name().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
