//! The reconcile manager (spec.md §4.7, C7): top-level orchestrator holding
//! the class cache, the namespace map, the deployer, the validators, the
//! downstream store handle, and a single read/write barrier.

use std::sync::Arc;

use ahash::AHashMap;
use gateway_api::apis::standard::gatewayclasses::GatewayClass;
use gateway_api::apis::standard::gateways::Gateway;
use gateway_api::apis::standard::httproutes::HTTPRoute;
use gateway_api::apis::experimental::tcproutes::TCPRoute;
use kube::ResourceExt;
use parking_lot::RwLock as SyncRwLock;
use tokio_util::sync::CancellationToken;

use crate::adapters;
use crate::backend_resolver::BackendResolver;
use crate::binder::{self, BindContext};
use crate::cluster_api::{ClusterApiClient, RouteParentStatusPatch};
use crate::consts::{self, GATEWAY_CLASS_CONTROLLER_NAME};
use crate::deployer;
use crate::error::{Error, Result};
use crate::mesh::MeshClient;
use crate::model::class_config::{ClassCache, GatewayClassConfig};
use crate::model::gateway::GatewayState;
use crate::model::ids::{GatewayId, NamespacedName, RouteId, RouteKind};
use crate::model::namespace_map::NamespaceMap;
use crate::model::reference_grant::ReferenceGrant;
use crate::model::route::{Route, RouteState};
use crate::store::{DownstreamStore, StoredGateway, StoredRoute};
use crate::validators::gateway::{validate_gateway, GatewayValidationInput, ServiceType};
use crate::validators::route::{validate_route, RouteValidationContext};

pub struct ReconcileManager<C, S, M, B> {
    cluster: Arc<C>,
    store: Arc<S>,
    mesh: Arc<M>,
    backend_resolver: Arc<B>,
    class_cache: ClassCache,
    namespace_map: NamespaceMap,
    /// The latest validated `GatewayState` for every managed gateway,
    /// shared with route upserts so the binder (§4.4) has live listeners to
    /// attach to. Keyed by gateway identity; one entry survives until the
    /// next successful gateway validation or an explicit delete.
    gateway_states: SyncRwLock<AHashMap<GatewayId, Arc<tokio::sync::Mutex<GatewayState>>>>,
    /// Gateway upserts take this write-locked; route upserts take it
    /// read-locked, so routes never race a gateway mutation on the same
    /// identity but may run concurrently with each other (spec.md §5).
    barrier: tokio::sync::RwLock<()>,
}

impl<C, S, M, B> ReconcileManager<C, S, M, B>
where
    C: ClusterApiClient,
    S: DownstreamStore,
    M: MeshClient,
    B: BackendResolver,
{
    pub fn new(cluster: Arc<C>, store: Arc<S>, mesh: Arc<M>, backend_resolver: Arc<B>) -> Self {
        Self {
            cluster,
            store,
            mesh,
            backend_resolver,
            class_cache: ClassCache::new(),
            namespace_map: NamespaceMap::new(),
            gateway_states: SyncRwLock::new(AHashMap::new()),
            barrier: tokio::sync::RwLock::new(()),
        }
    }

    /// spec.md §4.7: GatewayClass upsert/delete as a first-class entry point
    /// (§9 supplemented feature), mirroring the ownership-acceptance pattern.
    pub fn upsert_gateway_class(&self, class: &GatewayClass) -> bool {
        if class.spec.controller_name != GATEWAY_CLASS_CONTROLLER_NAME {
            return false;
        }
        let config = GatewayClassConfig {
            class_name: class.name_any(),
            scheme: "http".to_string(),
            service_account_name: None,
            image: String::new(),
            replicas: 1,
            sds_host: String::new(),
            sds_port: 0,
            mirror_namespace: false,
        };
        self.class_cache.insert(config);
        true
    }

    pub fn delete_gateway_class(&self, name: &str) {
        self.class_cache.remove(name);
    }

    fn resolve_class_config(&self, gateway: &Gateway) -> Option<GatewayClassConfig> {
        if let Some(annotations) = &gateway.metadata.annotations {
            if let Some(raw) = annotations.get(&consts::config_annotation()) {
                if let Ok(config) = serde_json::from_str::<GatewayClassConfig>(raw) {
                    return Some(config);
                }
            }
        }
        self.class_cache.get(&gateway.spec.gateway_class_name)
    }

    /// `UpsertGateway` (spec.md §4.7, write-locked). Returns the freshly
    /// computed status, or `None` if this gateway is unmanaged or the config
    /// annotation was just written for the first time (spec.md §4.7 steps
    /// 1–2).
    ///
    /// `cancel` is the per-call cancellation token (spec.md §5): every
    /// suspended cluster-API/store call this reconcile makes is aborted at
    /// its current yield point the moment `cancel` fires, since dropping the
    /// raced future mid-poll drops every local binding with it.
    pub async fn upsert_gateway(
        &self,
        gateway: &Gateway,
        downstream_namespace: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<crate::model::gateway::GatewayStatus>> {
        match cancel
            .run_until_cancelled(self.upsert_gateway_inner(gateway, downstream_namespace))
            .await
        {
            Some(result) => result,
            None => Err(Error::Cancelled),
        }
    }

    async fn upsert_gateway_inner(
        &self,
        gateway: &Gateway,
        downstream_namespace: &str,
    ) -> Result<Option<crate::model::gateway::GatewayStatus>> {
        let _guard = self.barrier.write().await;

        let Some(config) = self.resolve_class_config(gateway) else {
            return Ok(None);
        };

        let namespace = gateway.namespace().ok_or(Error::MissingNamespace)?;
        let name = gateway.name_any();
        let generation = gateway.meta().generation.unwrap_or(0);

        if gateway
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(&consts::config_annotation()))
            .is_none()
        {
            // First write of the pinned config; the resulting update event
            // re-triggers reconciliation (spec.md §4.7 step 2).
            return Ok(None);
        }

        let id = GatewayId::new(namespace.clone(), name.clone());
        let listeners = adapters::listener_states_from_gateway(gateway);
        let reference_grants = self.cluster.list_reference_grants(&namespace).await?;
        let certificate_secret_exists = self
            .resolve_certificate_existence(&namespace, gateway, &reference_grants)
            .await?;

        let input = GatewayValidationInput {
            namespace: &namespace,
            name: &name,
            generation,
            listeners,
            requested_addresses: gateway
                .spec
                .addresses
                .as_ref()
                .map(|a| !a.is_empty())
                .unwrap_or(false),
            pod_name: Some(&name),
            service_name: &name,
            service_type: ServiceType::LoadBalancer,
            reference_grants: &reference_grants,
            certificate_secret_exists,
        };

        let mut state = validate_gateway(input, self.cluster.as_ref()).await?;
        let addresses = state.addresses.clone();

        self.mesh.ensure_namespace(downstream_namespace).await.ok();
        self.namespace_map
            .insert(id.clone(), downstream_namespace.to_string());

        let persisted = self.store.get_gateway(&id).await?;
        let resource_version = gateway.resource_version().unwrap_or_default();

        // Deploy (spec.md §4.5), then publish to the downstream store
        // (spec.md §4.6 "sync"); `update_gateway_status_on_sync` reflects
        // either outcome into `state.status.in_sync` and tells us whether
        // the resulting status actually changed.
        let deploy = deployer::deploy(
            &namespace,
            &name,
            downstream_namespace,
            &config,
            None,
            self.cluster.as_ref(),
        );
        let sync = self.store.upsert_gateway(
            id.clone(),
            StoredGateway {
                resource_version,
                status: state.status.clone(),
                generation,
            },
        );
        let updated_status = crate::status_updater::update_gateway_status_on_sync(
            &mut state,
            persisted.as_ref().map(|p| &p.status),
            deploy,
            sync,
        )
        .await?;

        if let Some(fresh) = &updated_status {
            let listener_patches: Vec<_> = state
                .listeners
                .iter()
                .map(|l| {
                    let (name, attached_routes, conditions) = l.status_patch(generation);
                    crate::cluster_api::ListenerStatusPatch {
                        name,
                        attached_routes,
                        conditions,
                    }
                })
                .collect();
            self.cluster
                .update_gateway_status(
                    &namespace,
                    &name,
                    &fresh.conditions(generation),
                    &addresses,
                    &listener_patches,
                )
                .await?;
        }

        self.gateway_states
            .write()
            .insert(id, Arc::new(tokio::sync::Mutex::new(state)));

        Ok(updated_status)
    }

    async fn resolve_certificate_existence(
        &self,
        gateway_namespace: &str,
        gateway: &Gateway,
        _reference_grants: &[ReferenceGrant],
    ) -> Result<Vec<bool>> {
        let mut result = Vec::with_capacity(gateway.spec.listeners.len());
        for listener in &gateway.spec.listeners {
            let exists = match &listener.tls {
                Some(tls) => match tls.certificate_refs.as_ref().and_then(|refs| refs.first()) {
                    Some(cert_ref) => {
                        let cert_namespace = cert_ref
                            .namespace
                            .clone()
                            .unwrap_or_else(|| gateway_namespace.to_string());
                        self.cluster
                            .get_secret(&cert_namespace, &cert_ref.name)
                            .await?
                            .is_some()
                    }
                    None => false,
                },
                None => true,
            };
            result.push(exists);
        }
        Ok(result)
    }

    pub async fn delete_gateway(&self, id: &GatewayId, cancel: &CancellationToken) -> Result<()> {
        match cancel.run_until_cancelled(self.delete_gateway_inner(id)).await {
            Some(result) => result,
            None => Err(Error::Cancelled),
        }
    }

    async fn delete_gateway_inner(&self, id: &GatewayId) -> Result<()> {
        let _guard = self.barrier.write().await;
        self.store.delete_gateway(id).await?;
        self.namespace_map.remove(id);
        self.gateway_states.write().remove(id);
        Ok(())
    }

    pub async fn upsert_http_route(
        &self,
        route: &HTTPRoute,
        cancel: &CancellationToken,
    ) -> Result<Option<RouteState>> {
        let meta = route_meta(route)?;
        let generation = route.meta().generation.unwrap_or(0);
        let fut = self.upsert_route(
            adapters::route_from_http_route(route),
            &meta,
            generation,
            route.resource_version(),
        );
        match cancel.run_until_cancelled(fut).await {
            Some(result) => result,
            None => Err(Error::Cancelled),
        }
    }

    pub async fn upsert_tcp_route(
        &self,
        route: &TCPRoute,
        cancel: &CancellationToken,
    ) -> Result<Option<RouteState>> {
        let meta = route_meta(route)?;
        let generation = route.meta().generation.unwrap_or(0);
        let fut = self.upsert_route(
            adapters::route_from_tcp_route(route),
            &meta,
            generation,
            route.resource_version(),
        );
        match cancel.run_until_cancelled(fut).await {
            Some(result) => result,
            None => Err(Error::Cancelled),
        }
    }

    /// Generic internal path both typed entry points funnel into (spec.md
    /// §9 "dual route-upsert entry points"). Binds the route against every
    /// managed gateway it targets (spec.md §4.4), then merges the resulting
    /// parent statuses with any foreign-controller entries already persisted
    /// before writing the route's status back (spec.md §4.6).
    async fn upsert_route(
        &self,
        route: Route,
        meta: &NamespacedName,
        generation: i64,
        resource_version: Option<String>,
    ) -> Result<Option<RouteState>> {
        let _guard = self.barrier.read().await;

        let mut managed_gateways: Vec<GatewayId> = Vec::new();
        for parent in route.parent_refs() {
            let gateway_namespace = parent.namespace.as_deref().unwrap_or(&meta.namespace);
            let id = GatewayId::new(gateway_namespace, parent.name.clone());
            if managed_gateways.contains(&id) {
                continue;
            }
            if self.namespace_map.contains_gateway(&id) {
                managed_gateways.push(id);
                continue;
            }
            // Cold-start fallback (spec.md §4.7 step 1, §9): the namespace
            // map only knows about gateways this process has already
            // reconciled. A route that arrives before its gateway falls back
            // to a remote lookup rather than being defensively deleted.
            if let Some(gateway) = self
                .cluster
                .get_gateway(&id.0.namespace, &id.0.name)
                .await?
            {
                if self.resolve_class_config(&gateway).is_some() {
                    managed_gateways.push(id);
                }
            }
        }

        let route_kind = match &route {
            Route::Http { .. } => RouteKind::Http,
            Route::Tcp { .. } => RouteKind::Tcp,
        };
        let route_id = RouteId::new(route_kind, meta.namespace.clone(), meta.name.clone());

        if managed_gateways.is_empty() {
            self.store.delete_route(&route_id).await?;
            return Ok(None);
        }

        let reference_grants = self.cluster.list_reference_grants(&meta.namespace).await?;
        let ctx = RouteValidationContext {
            namespace: &meta.namespace,
            reference_grants: &reference_grants,
        };
        let mut state = validate_route(&route, &ctx, self.backend_resolver.as_ref()).await?;

        let namespace_labels = self
            .cluster
            .get_namespace(&meta.namespace)
            .await?
            .and_then(|ns| ns.metadata.labels)
            .unwrap_or_default();
        let route_namespace_labels = crate::validators::gateway::augmented_namespace_labels(
            namespace_labels,
            &meta.namespace,
        );

        for gateway_id in &managed_gateways {
            let cached = self.gateway_states.read().get(gateway_id).cloned();
            let Some(gateway_cell) = cached else {
                continue;
            };
            let mut gateway_state = gateway_cell.lock().await;
            let bind_ctx = BindContext {
                route_namespace: &meta.namespace,
                route_namespace_labels: &route_namespace_labels,
                gateway_namespace: &gateway_id.0.namespace,
                gateway_name: &gateway_id.0.name,
            };
            binder::bind(&mut gateway_state, &route, &mut state, &bind_ctx);
        }

        let persisted = self.store.get_route(&route_id).await?;
        let persisted_parents = persisted.as_ref().map(|p| &p.state.parent_statuses);
        if let Some(merged) = crate::status_updater::update_route_status(
            &state.parent_statuses,
            persisted_parents,
            generation,
        ) {
            let mut patches = Vec::with_capacity(merged.len());
            for (parent_key, status) in &merged {
                let parent_ref_json = serde_json::from_str(parent_key)
                    .map_err(|e| Error::InvalidConfig(e.to_string()))?;
                patches.push(RouteParentStatusPatch {
                    parent_ref_json,
                    controller_name: status.controller_name.clone(),
                    conditions: status.conditions(generation),
                });
            }
            self.cluster
                .update_route_status(route_kind, &meta.namespace, &meta.name, &patches)
                .await?;
        }

        self.store
            .upsert_route(
                route_id,
                StoredRoute {
                    resource_version: resource_version.unwrap_or_default(),
                    state: state.clone(),
                },
            )
            .await?;

        Ok(Some(state))
    }

    pub async fn delete_route(&self, id: &RouteId, cancel: &CancellationToken) -> Result<()> {
        match cancel.run_until_cancelled(self.delete_route_inner(id)).await {
            Some(result) => result,
            None => Err(Error::Cancelled),
        }
    }

    async fn delete_route_inner(&self, id: &RouteId) -> Result<()> {
        let _guard = self.barrier.read().await;
        self.store.delete_route(id).await?;
        Ok(())
    }
}

fn route_meta<K: kube::Resource<DynamicType = ()>>(route: &K) -> Result<NamespacedName> {
    Ok(NamespacedName::new(
        route.namespace().ok_or(Error::MissingNamespace)?,
        route.name_any(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend_resolver::BackendResolver;
    use crate::error::ResolutionError;
    use crate::mesh::NoopMeshClient;
    use crate::model::route::BackendRef;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;

    struct NullCluster;
    #[async_trait]
    impl ClusterApiClient for NullCluster {
        async fn get_secret(
            &self,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::core::v1::Secret>> {
            Ok(None)
        }
        async fn get_pod(&self, _ns: &str, _name: &str) -> Result<Option<k8s_openapi::api::core::v1::Pod>> {
            Ok(None)
        }
        async fn get_service(
            &self,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::core::v1::Service>> {
            Ok(None)
        }
        async fn get_namespace(
            &self,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::core::v1::Namespace>> {
            Ok(None)
        }
        async fn get_deployment(
            &self,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::apps::v1::Deployment>> {
            Ok(None)
        }
        async fn list_reference_grants(&self, _ns: &str) -> Result<Vec<ReferenceGrant>> {
            Ok(vec![])
        }
        async fn get_gateway(
            &self,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<gateway_api::apis::standard::gateways::Gateway>> {
            Ok(None)
        }
        async fn ensure_service_account(&self, _ns: &str, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn upsert_secret(
            &self,
            _ns: &str,
            _secret: k8s_openapi::api::core::v1::Secret,
        ) -> Result<()> {
            Ok(())
        }
        async fn upsert_deployment(
            &self,
            _ns: &str,
            _deployment: k8s_openapi::api::apps::v1::Deployment,
        ) -> Result<()> {
            Ok(())
        }
        async fn upsert_service(
            &self,
            _ns: &str,
            _service: k8s_openapi::api::core::v1::Service,
        ) -> Result<()> {
            Ok(())
        }
        async fn ensure_namespace(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn update_gateway_status(
            &self,
            _ns: &str,
            _name: &str,
            _conditions: &[k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition],
            _addresses: &[String],
            _listeners: &[crate::cluster_api::ListenerStatusPatch],
        ) -> Result<()> {
            Ok(())
        }
        async fn update_route_status(
            &self,
            _kind: RouteKind,
            _ns: &str,
            _name: &str,
            _parents: &[crate::cluster_api::RouteParentStatusPatch],
        ) -> Result<()> {
            Ok(())
        }
    }

    struct FallbackCluster(Gateway);
    #[async_trait]
    impl ClusterApiClient for FallbackCluster {
        async fn get_secret(
            &self,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::core::v1::Secret>> {
            Ok(None)
        }
        async fn get_pod(&self, _ns: &str, _name: &str) -> Result<Option<k8s_openapi::api::core::v1::Pod>> {
            Ok(None)
        }
        async fn get_service(
            &self,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::core::v1::Service>> {
            Ok(None)
        }
        async fn get_namespace(
            &self,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::core::v1::Namespace>> {
            Ok(None)
        }
        async fn get_deployment(
            &self,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<k8s_openapi::api::apps::v1::Deployment>> {
            Ok(None)
        }
        async fn list_reference_grants(&self, _ns: &str) -> Result<Vec<ReferenceGrant>> {
            Ok(vec![])
        }
        async fn get_gateway(&self, _ns: &str, _name: &str) -> Result<Option<Gateway>> {
            Ok(Some(self.0.clone()))
        }
        async fn ensure_service_account(&self, _ns: &str, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn upsert_secret(
            &self,
            _ns: &str,
            _secret: k8s_openapi::api::core::v1::Secret,
        ) -> Result<()> {
            Ok(())
        }
        async fn upsert_deployment(
            &self,
            _ns: &str,
            _deployment: k8s_openapi::api::apps::v1::Deployment,
        ) -> Result<()> {
            Ok(())
        }
        async fn upsert_service(
            &self,
            _ns: &str,
            _service: k8s_openapi::api::core::v1::Service,
        ) -> Result<()> {
            Ok(())
        }
        async fn ensure_namespace(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn update_gateway_status(
            &self,
            _ns: &str,
            _name: &str,
            _conditions: &[k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition],
            _addresses: &[String],
            _listeners: &[crate::cluster_api::ListenerStatusPatch],
        ) -> Result<()> {
            Ok(())
        }
        async fn update_route_status(
            &self,
            _kind: RouteKind,
            _ns: &str,
            _name: &str,
            _parents: &[crate::cluster_api::RouteParentStatusPatch],
        ) -> Result<()> {
            Ok(())
        }
    }

    struct AlwaysOkResolver;
    #[async_trait]
    impl BackendResolver for AlwaysOkResolver {
        async fn resolve(
            &self,
            _namespace: &str,
            _backend: &BackendRef,
        ) -> Result<std::result::Result<(), ResolutionError>> {
            Ok(Ok(()))
        }
    }

    fn manager() -> ReconcileManager<NullCluster, InMemoryStore, NoopMeshClient, AlwaysOkResolver> {
        ReconcileManager::new(
            Arc::new(NullCluster),
            Arc::new(InMemoryStore::new()),
            Arc::new(NoopMeshClient),
            Arc::new(AlwaysOkResolver),
        )
    }

    #[tokio::test]
    async fn delete_route_honors_an_already_cancelled_token() {
        let manager = manager();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = manager
            .delete_route(&RouteId::new(RouteKind::Tcp, "default".to_string(), "r".to_string()), &cancel)
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn route_with_no_managed_gateway_parent_deletes_and_returns_none() {
        let manager = manager();
        let route = Route::Tcp {
            parent_refs: vec![crate::model::route::ParentRef {
                group: None,
                kind: None,
                namespace: None,
                name: "unmanaged-gw".to_string(),
                section_name: None,
            }],
            rules: vec![],
        };
        let meta = NamespacedName::new("default", "my-route");
        let result = manager
            .upsert_route(route, &meta, 1, Some("1".to_string()))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn route_upsert_falls_back_to_remote_gateway_lookup_on_cold_start() {
        use std::collections::BTreeMap;

        let config = crate::model::class_config::GatewayClassConfig {
            class_name: "mesh".to_string(),
            scheme: "http".to_string(),
            service_account_name: None,
            image: String::new(),
            replicas: 1,
            sds_host: String::new(),
            sds_port: 0,
            mirror_namespace: false,
        };
        let mut annotations = BTreeMap::new();
        annotations.insert(
            consts::config_annotation(),
            serde_json::to_string(&config).unwrap(),
        );
        // Built from minimal JSON rather than a full struct literal: the
        // generated `GatewaySpec` carries several optional fields this test
        // doesn't care about, and they deserialize to their defaults.
        let gateway: Gateway = serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": "gw",
                "namespace": "default",
                "annotations": annotations,
            },
            "spec": {
                "gatewayClassName": "mesh",
                "listeners": [],
            },
        }))
        .unwrap();

        let manager = ReconcileManager::new(
            Arc::new(FallbackCluster(gateway)),
            Arc::new(InMemoryStore::new()),
            Arc::new(NoopMeshClient),
            Arc::new(AlwaysOkResolver),
        );

        // Neither the namespace map nor the gateway-state cache has this
        // gateway yet — simulating a route event delivered before the
        // gateway's own reconcile has run.
        let route = Route::Tcp {
            parent_refs: vec![crate::model::route::ParentRef {
                group: None,
                kind: None,
                namespace: None,
                name: "gw".to_string(),
                section_name: None,
            }],
            rules: vec![],
        };
        let meta = NamespacedName::new("default", "my-route");
        let result = manager
            .upsert_route(route, &meta, 1, Some("1".to_string()))
            .await
            .unwrap();
        // The route is recognized as targeting a managed gateway (so it is
        // not defensively deleted), even though binding is deferred until
        // the gateway itself is reconciled and its listeners are cached.
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn route_upsert_binds_against_a_managed_gateway_and_updates_parent_status() {
        let manager = manager();
        let gateway_id = GatewayId::new("default", "gw");
        manager
            .namespace_map
            .insert(gateway_id.clone(), "mesh-default-gw".to_string());

        let listener_spec = crate::model::listener::ListenerSpec {
            ordinal: 0,
            name: "http".to_string(),
            protocol: crate::model::listener::Protocol::Http,
            port: 80,
            hostname: None,
            allowed_kinds: vec![],
            namespace_policy: crate::model::listener::NamespacePolicy::Same,
            tls: None,
        };
        let gateway_state = GatewayState::new(
            1,
            vec![crate::model::listener::ListenerState::new(listener_spec)],
        );
        manager
            .gateway_states
            .write()
            .insert(gateway_id.clone(), Arc::new(tokio::sync::Mutex::new(gateway_state)));

        let route = Route::Http {
            parent_refs: vec![crate::model::route::ParentRef {
                group: None,
                kind: None,
                namespace: Some("default".to_string()),
                name: "gw".to_string(),
                section_name: None,
            }],
            rules: vec![],
            http: crate::model::route::HttpRouteData::default(),
        };
        let meta = NamespacedName::new("default", "my-route");
        let result = manager
            .upsert_route(route, &meta, 1, Some("1".to_string()))
            .await
            .unwrap();
        let state = result.unwrap();
        assert!(state.parent_statuses.values().any(|p| matches!(
            p.accepted,
            crate::status::aspect::Accepted::Accepted
        )));

        let cached = manager
            .gateway_states
            .read()
            .get(&gateway_id)
            .cloned()
            .unwrap();
        let gateway = cached.lock().await;
        assert_eq!(gateway.listeners[0].route_count(), 1);
    }

    #[test]
    fn gateway_class_acceptance_checks_controller_name() {
        let manager = manager();
        let mut class = GatewayClass {
            metadata: Default::default(),
            spec: gateway_api::apis::standard::gatewayclasses::GatewayClassSpec {
                controller_name: "some.other/controller".to_string(),
                parameters_ref: None,
                description: None,
            },
            status: None,
        };
        assert!(!manager.upsert_gateway_class(&class));
        class.spec.controller_name = GATEWAY_CLASS_CONTROLLER_NAME.to_string();
        assert!(manager.upsert_gateway_class(&class));
    }
}
