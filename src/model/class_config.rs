use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Parameters pinned to a GatewayClass; round-tripped through the
/// `…/config` annotation on every gateway the class owns (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayClassConfig {
    pub class_name: String,
    /// "http" or "https" — https causes the deployer to provision a CA bundle secret.
    pub scheme: String,
    pub service_account_name: Option<String>,
    pub image: String,
    pub replicas: i32,
    pub sds_host: String,
    pub sds_port: u16,
    #[serde(default)]
    pub mirror_namespace: bool,
}

impl GatewayClassConfig {
    pub fn requires_ca_bundle(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }
}

/// An in-memory cache from GatewayClass name to its resolved config.
///
/// Guarded by `parking_lot::RwLock`, in the idiom the namespace map
/// uses (spec.md §5) — the class cache is "internally synchronized".
#[derive(Default)]
pub struct ClassCache {
    inner: RwLock<AHashMap<String, GatewayClassConfig>>,
}

impl ClassCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class_name: &str) -> Option<GatewayClassConfig> {
        self.inner.read().get(class_name).cloned()
    }

    pub fn insert(&self, config: GatewayClassConfig) {
        self.inner.write().insert(config.class_name.clone(), config);
    }

    pub fn remove(&self, class_name: &str) {
        self.inner.write().remove(class_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(class_name: &str) -> GatewayClassConfig {
        GatewayClassConfig {
            class_name: class_name.to_string(),
            scheme: "https".to_string(),
            service_account_name: Some("mesh-gateway".to_string()),
            image: "mesh-gateway:latest".to_string(),
            replicas: 1,
            sds_host: "consul-server-grpc".to_string(),
            sds_port: 8502,
            mirror_namespace: false,
        }
    }

    #[test]
    fn https_scheme_requires_ca_bundle() {
        assert!(sample("default").requires_ca_bundle());
        let mut http = sample("default");
        http.scheme = "http".to_string();
        assert!(!http.requires_ca_bundle());
    }

    #[test]
    fn cache_roundtrips_by_class_name() {
        let cache = ClassCache::new();
        assert!(cache.get("default").is_none());
        cache.insert(sample("default"));
        assert_eq!(cache.get("default").unwrap().sds_port, 8502);
        cache.remove("default");
        assert!(cache.get("default").is_none());
    }
}
