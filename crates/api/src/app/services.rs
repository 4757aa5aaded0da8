use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use gatehouse_auth::{RbacRegistry, TokenManager};

/// Shared services handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    pub tokens: Arc<TokenManager>,
    pub rbac: Arc<RbacRegistry>,
    pub documents: Arc<DocumentStore>,
}

impl AppServices {
    pub fn new(tokens: TokenManager, rbac: RbacRegistry) -> Self {
        Self {
            tokens: Arc::new(tokens),
            rbac: Arc::new(rbac),
            documents: Arc::new(DocumentStore::default()),
        }
    }
}

/// In-memory documents guarded by the `document` resource permissions.
#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: RwLock<BTreeMap<String, String>>,
}

impl DocumentStore {
    pub fn get(&self, id: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Returns `true` if the document was newly created.
    pub fn put(&self, id: String, body: String) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, body)
            .is_none()
    }

    pub fn remove(&self, id: &str) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }
}
