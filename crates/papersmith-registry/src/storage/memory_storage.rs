//! In-memory template store
//!
//! Holds templates for the lifetime of the process. Used when no object
//! storage is configured, and throughout the tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{StorageError, StoredTemplate, TemplateStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    templates: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(name, content)` pairs
    pub fn with_templates<I, N, C>(templates: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            templates: RwLock::new(
                templates
                    .into_iter()
                    .map(|(name, content)| (name.into(), content.into()))
                    .collect(),
            ),
        }
    }

    /// Get number of stored templates
    pub fn len(&self) -> usize {
        self.templates.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("Lock poisoned".into())
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get_by_name(&self, name: &str) -> Result<Option<String>, StorageError> {
        let templates = self.templates.read().map_err(|_| poisoned())?;
        Ok(templates.get(name).cloned())
    }

    async fn get_all(&self) -> Result<Vec<StoredTemplate>, StorageError> {
        let templates = self.templates.read().map_err(|_| poisoned())?;
        Ok(templates
            .iter()
            .map(|(name, content)| StoredTemplate::with_content(name.clone(), content.clone()))
            .collect())
    }

    async fn add(&self, name: &str, content: &str) -> Result<(), StorageError> {
        let mut templates = self.templates.write().map_err(|_| poisoned())?;
        templates.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic_operations() {
        let store = MemoryStore::new();

        store.add("invoice", "Hello {{Name}}").await.unwrap();
        let retrieved = store.get_by_name("invoice").await.unwrap();
        assert_eq!(retrieved.as_deref(), Some("Hello {{Name}}"));

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_absence_is_not_an_error() {
        let store = MemoryStore::new();
        assert_eq!(store.get_by_name("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_empty_content_is_present() {
        let store = MemoryStore::new();
        store.add("blank", "").await.unwrap();
        assert_eq!(store.get_by_name("blank").await.unwrap(), Some(String::new()));
    }

    #[tokio::test]
    async fn test_memory_store_add_overwrites() {
        let store = MemoryStore::new();
        store.add("invoice", "first").await.unwrap();
        store.add("invoice", "second").await.unwrap();

        assert_eq!(store.get_by_name("invoice").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_get_all_includes_content() {
        let store = MemoryStore::with_templates([("a", "A"), ("b", "B")]);

        let mut all = store.get_all().await.unwrap();
        all.sort_by(|x, y| x.name.cmp(&y.name));

        assert_eq!(
            all,
            vec![
                StoredTemplate::with_content("a", "A"),
                StoredTemplate::with_content("b", "B"),
            ]
        );
    }
}
