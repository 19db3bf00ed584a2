use crate::error::{ErrorKind, Result};
use crate::namespace::Namespace;
use filer_config::Config;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Every namespace that opened successfully, by name.
#[derive(Default, Clone)]
pub struct Registry {
    namespaces: BTreeMap<String, Arc<Namespace>>,
}

impl Registry {
    /// Open every configured namespace.
    ///
    /// A namespace that fails to open is logged and left out; the others
    /// still serve. Only when none open at all is this an error.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::default();
        for (name, namespace) in &config.namespaces {
            match Namespace::from_config(name, namespace).await {
                Ok(namespace) => registry.insert(namespace),
                Err(e) => tracing::error!(namespace = %name, error = ?e, "Namespace failed to open; not serving it"),
            }
        }
        if registry.is_empty() {
            exn::bail!(ErrorKind::NoNamespaces);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, namespace: Namespace) {
        self.namespaces.insert(namespace.name().to_string(), Arc::new(namespace));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
