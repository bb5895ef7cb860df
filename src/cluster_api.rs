//! The cluster API client (spec.md §1, §6): reads for
//! Secret/Pod/Service/Namespace/Deployment and reference grants, writes for
//! ServiceAccount/Secret/Service/Deployment. Modeled as an async trait so the
//! reconciliation core is unit-testable without a live cluster (spec.md §4).
//!
//! `Ok(None)` denotes NotFound; any other failure is `Err` and is fatal to
//! the reconcile pass (spec.md §7 "Infrastructure").

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Secret, Service, ServiceAccount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::api::{ObjectMeta, Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;

use crate::consts::FIELD_MANAGER;
use crate::error::{Error, Result};
use crate::model::ids::RouteKind;
use crate::model::reference_grant::ReferenceGrant;

/// One `status.parents[]` entry this controller owns on a route (spec.md §6,
/// §9 "status merging" — foreign entries are left alone by construction,
/// since this patch only ever targets our own `controllerName`).
pub struct RouteParentStatusPatch {
    pub parent_ref_json: serde_json::Value,
    pub controller_name: String,
    pub conditions: Vec<Condition>,
}

/// One `status.listeners[]` entry (spec.md §3 `ListenerStatus`): name,
/// attached-route count and its own aspect conditions (Ready/Detached/
/// ResolvedRefs/Conflicted).
pub struct ListenerStatusPatch {
    pub name: String,
    pub attached_routes: i32,
    pub conditions: Vec<Condition>,
}

#[async_trait]
pub trait ClusterApiClient: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>>;
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>>;
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>>;
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Option<Deployment>>;
    async fn list_reference_grants(&self, namespace: &str) -> Result<Vec<ReferenceGrant>>;
    /// Remote fallback for `UpsertRoute`'s cold-start membership check
    /// (spec.md §4.7 step 1, §9 "Namespace map as cache") when a route's
    /// parent gateway isn't in the in-process namespace-map cache yet.
    async fn get_gateway(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<gateway_api::apis::standard::gateways::Gateway>>;

    async fn ensure_service_account(&self, namespace: &str, name: &str) -> Result<()>;
    async fn upsert_secret(&self, namespace: &str, secret: Secret) -> Result<()>;
    async fn upsert_deployment(&self, namespace: &str, deployment: Deployment) -> Result<()>;
    async fn upsert_service(&self, namespace: &str, service: Service) -> Result<()>;
    async fn ensure_namespace(&self, name: &str) -> Result<()>;

    /// `UpdateStatus` on a Gateway (spec.md §6 cluster API surface).
    async fn update_gateway_status(
        &self,
        namespace: &str,
        name: &str,
        conditions: &[Condition],
        addresses: &[String],
        listeners: &[ListenerStatusPatch],
    ) -> Result<()>;

    /// `UpdateStatus` on an HTTPRoute/TCPRoute (spec.md §6 cluster API surface).
    async fn update_route_status(
        &self,
        kind: RouteKind,
        namespace: &str,
        name: &str,
        parents: &[RouteParentStatusPatch],
    ) -> Result<()>;
}

/// The `kube`-backed reference implementation of [`ClusterApiClient`].
pub struct KubeClusterApiClient {
    client: Client,
}

impl KubeClusterApiClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn not_found_to_none<T>(result: kube::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
        Err(e) => Err(Error::KubeError(e)),
    }
}

#[async_trait]
impl ClusterApiClient for KubeClusterApiClient {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        not_found_to_none(api.get(name).await)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        not_found_to_none(api.get(name).await)
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<Service>> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        not_found_to_none(api.get(name).await)
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        not_found_to_none(api.get(name).await)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Option<Deployment>> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        not_found_to_none(api.get(name).await)
    }

    async fn list_reference_grants(&self, namespace: &str) -> Result<Vec<ReferenceGrant>> {
        use gateway_api::apis::experimental::referencegrants::ReferenceGrant as ApiReferenceGrant;
        let api: Api<ApiReferenceGrant> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&Default::default()).await?;
        Ok(list
            .items
            .into_iter()
            .map(|g| crate::adapters::reference_grant_from_api(namespace, g))
            .collect())
    }

    async fn get_gateway(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<gateway_api::apis::standard::gateways::Gateway>> {
        use gateway_api::apis::standard::gateways::Gateway;
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), namespace);
        not_found_to_none(api.get(name).await)
    }

    async fn ensure_service_account(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        if not_found_to_none(api.get(name).await)?.is_some() {
            return Ok(());
        }
        let sa = ServiceAccount {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        api.create(&Default::default(), &sa).await?;
        Ok(())
    }

    async fn upsert_secret(&self, namespace: &str, secret: Secret) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let name = secret
            .metadata
            .name
            .clone()
            .ok_or(Error::MissingName)?;
        api.patch(
            &name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&secret),
        )
        .await?;
        Ok(())
    }

    async fn upsert_deployment(&self, namespace: &str, deployment: Deployment) -> Result<()> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let name = deployment
            .metadata
            .name
            .clone()
            .ok_or(Error::MissingName)?;
        api.patch(
            &name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&deployment),
        )
        .await?;
        Ok(())
    }

    async fn upsert_service(&self, namespace: &str, service: Service) -> Result<()> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let name = service.metadata.name.clone().ok_or(Error::MissingName)?;
        api.patch(
            &name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&service),
        )
        .await?;
        Ok(())
    }

    async fn ensure_namespace(&self, name: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        if not_found_to_none(api.get(name).await)?.is_some() {
            return Ok(());
        }
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        api.create(&Default::default(), &ns).await?;
        Ok(())
    }

    async fn update_gateway_status(
        &self,
        namespace: &str,
        name: &str,
        conditions: &[Condition],
        addresses: &[String],
        listeners: &[ListenerStatusPatch],
    ) -> Result<()> {
        use gateway_api::apis::standard::gateways::Gateway;
        let api: Api<Gateway> = Api::namespaced(self.client.clone(), namespace);
        let addrs: Vec<_> = addresses
            .iter()
            .map(|ip| json!({"type": "IPAddress", "value": ip}))
            .collect();
        let listener_statuses: Vec<_> = listeners
            .iter()
            .map(|l| {
                json!({
                    "name": l.name,
                    "attachedRoutes": l.attached_routes,
                    "conditions": l.conditions,
                })
            })
            .collect();
        let patch = Patch::Apply(json!({
            "apiVersion": "gateway.networking.k8s.io/v1",
            "kind": "Gateway",
            "status": {
                "conditions": conditions,
                "addresses": addrs,
                "listeners": listener_statuses,
            }
        }));
        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER).force(), &patch)
            .await?;
        Ok(())
    }

    async fn update_route_status(
        &self,
        kind: RouteKind,
        namespace: &str,
        name: &str,
        parents: &[RouteParentStatusPatch],
    ) -> Result<()> {
        let parent_statuses: Vec<_> = parents
            .iter()
            .map(|p| {
                let mut entry = p.parent_ref_json.clone();
                entry["controllerName"] = json!(p.controller_name);
                entry["conditions"] = json!(p.conditions);
                entry
            })
            .collect();

        match kind {
            RouteKind::Http => {
                use gateway_api::apis::standard::httproutes::HTTPRoute;
                let api: Api<HTTPRoute> = Api::namespaced(self.client.clone(), namespace);
                let patch = Patch::Apply(json!({
                    "apiVersion": "gateway.networking.k8s.io/v1",
                    "kind": "HTTPRoute",
                    "status": { "parents": parent_statuses },
                }));
                api.patch_status(name, &PatchParams::apply(FIELD_MANAGER).force(), &patch)
                    .await?;
            }
            RouteKind::Tcp => {
                use gateway_api::apis::experimental::tcproutes::TCPRoute;
                let api: Api<TCPRoute> = Api::namespaced(self.client.clone(), namespace);
                let patch = Patch::Apply(json!({
                    "apiVersion": "gateway.networking.k8s.io/v1alpha2",
                    "kind": "TCPRoute",
                    "status": { "parents": parent_statuses },
                }));
                api.patch_status(name, &PatchParams::apply(FIELD_MANAGER).force(), &patch)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_parent_status_patch_carries_controller_and_conditions() {
        let patch = RouteParentStatusPatch {
            parent_ref_json: json!({"name": "gw"}),
            controller_name: "gateway.networking.k8s.io/mesh-gateway".to_string(),
            conditions: vec![],
        };
        assert_eq!(patch.parent_ref_json["name"], "gw");
        assert_eq!(patch.controller_name, "gateway.networking.k8s.io/mesh-gateway");
    }
}
