//! The backend resolver (spec.md §1, §4.3 RouteValidator): resolves a
//! backend reference into a concrete downstream-mesh upstream. Out of scope
//! for specification beyond its trait shape (spec.md §1) — this crate ships
//! a `Service`/`Endpoints`-based default implementation.

use async_trait::async_trait;

use crate::error::ResolutionError;
use crate::model::route::BackendRef;

#[async_trait]
pub trait BackendResolver: Send + Sync {
    /// Resolves `backend` in `namespace`. A resolution failure (backend
    /// absent from the mesh's service catalog, or the referenced
    /// `Service` missing) is returned as `Ok(Err(ResolutionError))` — not
    /// `Err` — since it is locally recovered (spec.md §7). `Err` is
    /// reserved for infrastructure failures.
    async fn resolve(
        &self,
        namespace: &str,
        backend: &BackendRef,
    ) -> crate::error::Result<std::result::Result<(), ResolutionError>>;
}

/// Resolves backends against plain Kubernetes `Service` objects via the
/// cluster API client, with no mesh-catalog cross-check.
pub struct ServiceBackendResolver<C> {
    cluster: std::sync::Arc<C>,
}

impl<C> ServiceBackendResolver<C> {
    pub fn new(cluster: std::sync::Arc<C>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl<C> BackendResolver for ServiceBackendResolver<C>
where
    C: crate::cluster_api::ClusterApiClient,
{
    async fn resolve(
        &self,
        namespace: &str,
        backend: &BackendRef,
    ) -> crate::error::Result<std::result::Result<(), ResolutionError>> {
        let group = backend.group.as_deref().unwrap_or("");
        let kind = backend.kind.as_deref().unwrap_or("Service");
        if !group.is_empty() || kind != "Service" {
            return Ok(Err(ResolutionError::Other {
                message: format!("unsupported backend reference kind: {group}/{kind}"),
            }));
        }
        let backend_namespace = backend.namespace.as_deref().unwrap_or(namespace);
        match self.cluster.get_service(backend_namespace, &backend.name).await? {
            Some(_) => Ok(Ok(())),
            None => Ok(Err(ResolutionError::ServiceNotFound {
                message: format!("service {backend_namespace}/{} not found", backend.name),
            })),
        }
    }
}
