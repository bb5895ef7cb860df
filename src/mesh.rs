//! The service-mesh client (spec.md §1, §4.5): ensures namespaces exist
//! downstream before the deployer mirrors resources into them. Out of scope
//! for specification beyond its trait shape.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait MeshClient: Send + Sync {
    async fn ensure_namespace(&self, namespace: &str) -> Result<()>;
}

/// A `MeshClient` that does nothing — correct when downstream-namespace
/// mirroring is disabled (spec.md §4.5 step 1).
pub struct NoopMeshClient;

#[async_trait]
impl MeshClient for NoopMeshClient {
    async fn ensure_namespace(&self, _namespace: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_mesh_client_always_succeeds() {
        assert!(NoopMeshClient.ensure_namespace("anything").await.is_ok());
    }
}
