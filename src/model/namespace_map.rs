use ahash::AHashMap;
use parking_lot::RwLock;

use super::ids::GatewayId;

/// `(gateway identity → downstream namespace)`, authoritative only for the
/// lifetime of this process (spec.md §9 "Namespace map as cache"). Written on
/// gateway upsert, read on route upsert, removed on gateway delete.
#[derive(Default)]
pub struct NamespaceMap {
    inner: RwLock<AHashMap<GatewayId, String>>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &GatewayId) -> Option<String> {
        self.inner.read().get(id).cloned()
    }

    pub fn insert(&self, id: GatewayId, downstream_namespace: String) {
        self.inner.write().insert(id, downstream_namespace);
    }

    pub fn remove(&self, id: &GatewayId) {
        self.inner.write().remove(id);
    }

    /// True if any cached gateway maps to this downstream namespace — used by
    /// `UpsertRoute`'s cold-start fallback before it issues a remote check.
    pub fn contains_gateway(&self, id: &GatewayId) -> bool {
        self.inner.read().contains_key(id)
    }
}
