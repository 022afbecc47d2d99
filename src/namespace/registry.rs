//! Namespace Registry
//!
//! Process-wide name lookup for namespaces, shared by the HTTP handlers and
//! application code.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::Result;
use crate::namespace::{Loader, Namespace};

/// Maps names to namespaces. Lookups take a shared lock; creation and
/// removal take it exclusively.
#[derive(Debug, Default)]
pub struct Registry {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Create ==
    /// Builds and registers a namespace, replacing any previous one with the
    /// same name.
    ///
    /// Fails with [`CacheError::MissingLoader`](crate::error::CacheError::MissingLoader)
    /// when `loader` is `None`; nothing is registered in that case.
    pub fn create(
        &self,
        name: impl Into<String>,
        cache_bytes: usize,
        loader: Option<Arc<dyn Loader>>,
    ) -> Result<Namespace> {
        let mut builder = Namespace::builder(name).cache_bytes(cache_bytes);
        if let Some(loader) = loader {
            builder = builder.shared_loader(loader);
        }
        let namespace = builder.build()?;
        self.insert(namespace.clone());
        Ok(namespace)
    }

    /// Registers an already built namespace under its own name.
    pub fn insert(&self, namespace: Namespace) {
        let name = namespace.name().to_string();
        let previous = self.namespaces.write().insert(name.clone(), namespace);
        if previous.is_some() {
            warn!(namespace = %name, "replaced existing namespace");
        } else {
            info!(namespace = %name, "namespace created");
        }
    }

    // == Lookup ==
    pub fn get(&self, name: &str) -> Option<Namespace> {
        self.namespaces.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Namespace> {
        self.namespaces.write().remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::namespace::LoaderFn;

    fn echo() -> Arc<dyn Loader> {
        Arc::new(LoaderFn(|key: &str| -> anyhow::Result<Vec<u8>> {
            Ok(key.as_bytes().to_vec())
        }))
    }

    #[test]
    fn test_create_then_get() {
        let registry = Registry::new();
        registry.create("scores", 2 << 10, Some(echo())).unwrap();

        let scores = registry.get("scores").unwrap();
        assert_eq!(scores.name(), "scores");
        let value = tokio_test::block_on(scores.get("Tom")).unwrap();
        assert_eq!(value.as_string(), "Tom");
    }

    #[test]
    fn test_get_unknown_is_none() {
        let registry = Registry::new();
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_create_without_loader_registers_nothing() {
        let registry = Registry::new();
        let err = registry.create("scores", 0, None).unwrap_err();
        assert!(matches!(err, CacheError::MissingLoader(_)));
        assert!(registry.get("scores").is_none());
    }

    #[test]
    fn test_lookups_share_one_namespace() {
        let registry = Registry::new();
        registry.create("scores", 0, Some(echo())).unwrap();

        let a = registry.get("scores").unwrap();
        tokio_test::block_on(a.get("Tom")).unwrap();

        let b = registry.get("scores").unwrap();
        tokio_test::block_on(b.get("Tom")).unwrap();
        assert_eq!(b.stats().local_loads, 1);
        assert_eq!(b.stats().cache_hits, 1);
    }

    #[test]
    fn test_create_replaces_same_name() {
        let registry = Registry::new();
        let first = registry.create("scores", 0, Some(echo())).unwrap();
        tokio_test::block_on(first.get("Tom")).unwrap();

        registry.create("scores", 0, Some(echo())).unwrap();
        let current = registry.get("scores").unwrap();
        assert_eq!(current.cache_stats().items, 0);
        assert_eq!(registry.names(), vec!["scores"]);
    }

    #[test]
    fn test_remove_and_names() {
        let registry = Registry::new();
        for name in ["scores", "images", "avatars"] {
            registry.create(name, 0, Some(echo())).unwrap();
        }
        assert_eq!(registry.names(), vec!["avatars", "images", "scores"]);

        assert!(registry.remove("images").is_some());
        assert!(registry.remove("images").is_none());
        assert_eq!(registry.names(), vec!["avatars", "scores"]);
    }
}
