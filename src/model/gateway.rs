use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;

use super::listener::ListenerState;
use crate::status::aspect::{GatewayReady, InSync, Scheduled};
use crate::status::{condition_lists_equal, sort_conditions};

/// Aggregated gateway-level status (spec.md §3, §4.2).
#[derive(Debug, Clone, Default)]
pub struct GatewayStatus {
    pub scheduled: Scheduled,
    pub ready: GatewayReady,
    pub in_sync: InSync,
}

impl GatewayStatus {
    pub fn conditions(&self, observed_generation: i64) -> Vec<Condition> {
        let mut conditions = vec![
            self.scheduled.render(observed_generation),
            self.ready.render(observed_generation),
            self.in_sync.render(observed_generation),
        ];
        sort_conditions(&mut conditions);
        conditions
    }
}

/// Equal iff the aggregated condition sequences are equal (spec.md §4.2, §8).
pub fn gateway_status_equal(a: &GatewayStatus, b: &GatewayStatus, observed_generation: i64) -> bool {
    condition_lists_equal(
        &a.conditions(observed_generation),
        &b.conditions(observed_generation),
    )
}

/// Ephemeral per-gateway state (spec.md §3). Rebuilt on every reconciliation;
/// never persisted directly — only the validated resource + status is.
pub struct GatewayState {
    pub generation: i64,
    pub pod_ready: bool,
    pub service_ready: bool,
    pub addresses: Vec<String>,
    pub listeners: Vec<ListenerState>,
    pub status: GatewayStatus,
}

impl GatewayState {
    pub fn new(generation: i64, listeners: Vec<ListenerState>) -> Self {
        Self {
            generation,
            pod_ready: false,
            service_ready: false,
            addresses: Vec::new(),
            listeners,
            status: GatewayStatus::default(),
        }
    }

    /// spec.md §4.3 "Per-listener pass" gateway-level rollup. `AddressNotAssigned`
    /// (step 2) takes precedence over the per-listener rollup, matching the
    /// aspect-precedence model of spec.md §4.2 — the first error slot set
    /// wins and later passes must not clobber it.
    pub fn reconcile_ready_rollup(&mut self) {
        if matches!(self.status.ready, GatewayReady::AddressNotAssigned) {
            return;
        }
        let listeners_invalid = self.listeners.iter().any(|l| !l.status.valid());
        let any_pending = self
            .listeners
            .iter()
            .any(|l| matches!(l.status.ready, crate::status::aspect::ListenerReady::Pending));
        self.status.ready = if listeners_invalid {
            GatewayReady::ListenersNotValid
        } else if !self.pod_ready || !self.service_ready || any_pending {
            GatewayReady::ListenersNotReady
        } else {
            GatewayReady::Ready
        };
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("generation", &self.generation)
            .field("pod_ready", &self.pod_ready)
            .field("service_ready", &self.service_ready)
            .field("addresses", &self.addresses)
            .field("listeners", &self.listeners.len())
            .field("status", &self.status)
            .finish()
    }
}
