//! The downstream configuration store (spec.md §1, §6): receives bound,
//! validated gateways and routes. Out of scope for specification beyond its
//! trait shape — this crate ships an in-memory reference implementation so
//! the core can be smoke-tested end-to-end.

use async_trait::async_trait;
use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::Result;
use crate::model::gateway::GatewayStatus;
use crate::model::ids::{GatewayId, RouteId};
use crate::model::route::RouteState;

/// A bound, validated gateway plus its resource version, as published to the
/// downstream store (spec.md §3, §6).
#[derive(Debug, Clone)]
pub struct StoredGateway {
    pub resource_version: String,
    pub status: GatewayStatus,
    pub generation: i64,
}

#[derive(Debug, Clone)]
pub struct StoredRoute {
    pub resource_version: String,
    pub state: RouteState,
}

/// `acceptPredicate` (spec.md §6): given the currently stored resource
/// version (absent on first write), decide whether the new write may
/// proceed. The monotonicity guard (spec.md §4.7, §8) is the caller's
/// standard predicate: accept iff absent or the new version is strictly
/// greater.
pub fn monotonic(current: Option<&str>, new: &str) -> bool {
    match current {
        None => true,
        Some(current) => new > current,
    }
}

#[async_trait]
pub trait DownstreamStore: Send + Sync {
    async fn upsert_gateway(&self, id: GatewayId, gateway: StoredGateway) -> Result<bool>;
    async fn upsert_route(&self, id: RouteId, route: StoredRoute) -> Result<bool>;
    async fn delete_gateway(&self, id: &GatewayId) -> Result<()>;
    async fn delete_route(&self, id: &RouteId) -> Result<()>;
    async fn get_gateway(&self, id: &GatewayId) -> Result<Option<StoredGateway>>;
    async fn get_route(&self, id: &RouteId) -> Result<Option<StoredRoute>>;
}

/// An in-memory `DownstreamStore`. Applies the resource-version monotonicity
/// guard itself (spec.md §4.7 step 4, §8).
#[derive(Default)]
pub struct InMemoryStore {
    gateways: Mutex<AHashMap<GatewayId, StoredGateway>>,
    routes: Mutex<AHashMap<RouteId, StoredRoute>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DownstreamStore for InMemoryStore {
    async fn upsert_gateway(&self, id: GatewayId, gateway: StoredGateway) -> Result<bool> {
        let mut gateways = self.gateways.lock();
        let current = gateways.get(&id).map(|g| g.resource_version.as_str());
        if !monotonic(current, &gateway.resource_version) {
            return Ok(false);
        }
        gateways.insert(id, gateway);
        Ok(true)
    }

    async fn upsert_route(&self, id: RouteId, route: StoredRoute) -> Result<bool> {
        let mut routes = self.routes.lock();
        let current = routes.get(&id).map(|r| r.resource_version.as_str());
        if !monotonic(current, &route.resource_version) {
            return Ok(false);
        }
        routes.insert(id, route);
        Ok(true)
    }

    async fn delete_gateway(&self, id: &GatewayId) -> Result<()> {
        self.gateways.lock().remove(id);
        Ok(())
    }

    async fn delete_route(&self, id: &RouteId) -> Result<()> {
        self.routes.lock().remove(id);
        Ok(())
    }

    async fn get_gateway(&self, id: &GatewayId) -> Result<Option<StoredGateway>> {
        Ok(self.gateways.lock().get(id).cloned())
    }

    async fn get_route(&self, id: &RouteId) -> Result<Option<StoredRoute>> {
        Ok(self.routes.lock().get(id).cloned())
    }
}
