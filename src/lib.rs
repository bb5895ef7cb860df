/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Reconciliation core for a Gateway API controller: validates Gateways and
//! Routes, binds routes to listeners, converges workload artifacts, and
//! publishes status and configuration downstream.

pub mod adapters;
pub mod backend_resolver;
pub mod binder;
pub mod cluster_api;
pub mod consts;
pub mod deployer;
pub mod error;
pub mod gateway_controller;
pub mod gatewayclass_controller;
pub mod httproute_controller;
pub mod matching;
pub mod mesh;
pub mod model;
pub mod reconcile_manager;
pub mod status;
pub mod status_updater;
pub mod store;
pub mod tcproute_controller;
pub mod validators;

pub use error::{Error, Result};
pub use gateway_controller::gateway_controller;
pub use gatewayclass_controller::gatewayclass_controller;
pub use httproute_controller::http_route_controller;
pub use model::ids::NamespacedName;
pub use reconcile_manager::ReconcileManager;
pub use tcproute_controller::tcp_route_controller;

use std::sync::Arc;

use kube::Client;

use crate::backend_resolver::ServiceBackendResolver;
use crate::cluster_api::KubeClusterApiClient;
use crate::mesh::NoopMeshClient;
use crate::store::InMemoryStore;

/// The concrete wiring this binary ships: a live cluster client, the
/// in-memory downstream store, no mesh-namespace mirroring, and backend
/// resolution against plain `Service` objects (spec.md §9 "which concrete
/// trait impls ship").
pub type DefaultReconcileManager =
    ReconcileManager<KubeClusterApiClient, InMemoryStore, NoopMeshClient, ServiceBackendResolver<KubeClusterApiClient>>;

/// Shared context handed to every controller loop in `main.rs`. One
/// `ReconcileManager` is shared across all controllers so the class cache,
/// namespace map and gateway-state cache built by one resource's reconciler
/// are visible to the others (spec.md §4.7, §5).
#[derive(Clone)]
pub struct Context {
    pub client: Client,
    pub manager: Arc<DefaultReconcileManager>,
}

impl Context {
    pub fn new(client: Client) -> Self {
        let cluster = Arc::new(KubeClusterApiClient::new(client.clone()));
        let manager = Arc::new(ReconcileManager::new(
            cluster.clone(),
            Arc::new(InMemoryStore::new()),
            Arc::new(NoopMeshClient),
            Arc::new(ServiceBackendResolver::new(cluster)),
        ));
        Self { client, manager }
    }
}
