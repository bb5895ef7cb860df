use std::sync::atomic::{AtomicU32, Ordering};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;

use crate::status::aspect::{Conflicted, Detached, ListenerReady, ListenerResolvedRefs};
use crate::status::{self, sort_conditions};

/// Listener protocol (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
    Tcp,
    Udp,
}

impl Protocol {
    /// Route kinds a listener of this protocol may accept (spec.md §4.3 "Protocol").
    pub fn supported_route_kinds(&self) -> &'static [&'static str] {
        match self {
            Protocol::Http | Protocol::Https => &["HTTPRoute"],
            Protocol::Tcp => &["TCPRoute"],
            Protocol::Udp => &[],
        }
    }

    pub fn requires_tls(&self) -> bool {
        matches!(self, Protocol::Https)
    }
}

/// `From` policy of a listener's `AllowedRoutes.Namespaces` (spec.md §4.1).
#[derive(Debug, Clone)]
pub enum NamespacePolicy {
    Same,
    All,
    Selector(std::collections::BTreeMap<String, String>),
    Unknown,
}

/// An allowed route kind entry (group defaults to the gateway-api group).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRouteKind {
    pub group: Option<String>,
    pub kind: String,
}

/// A listener's static spec (spec.md §3).
#[derive(Debug, Clone)]
pub struct ListenerSpec {
    pub ordinal: usize,
    pub name: String,
    pub protocol: Protocol,
    pub port: u16,
    pub hostname: Option<String>,
    pub allowed_kinds: Vec<AllowedRouteKind>,
    pub namespace_policy: NamespacePolicy,
    pub tls: Option<ListenerTlsSpec>,
}

#[derive(Debug, Clone)]
pub struct ListenerTlsSpec {
    pub passthrough: bool,
    pub certificate_refs: Vec<CertificateRef>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub cipher_suites: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRef {
    pub group: Option<String>,
    pub kind: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
}

/// Resolved TLS parameters a validated listener carries (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct ResolvedTls {
    pub certificate_secret: Option<crate::model::ids::NamespacedName>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub cipher_suites: Option<String>,
    pub enabled: bool,
}

/// The four aspects a listener independently tracks (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct ListenerStatus {
    pub ready: ListenerReady,
    pub detached: Detached,
    pub resolved_refs: ListenerResolvedRefs,
    pub conflicted: Conflicted,
}

impl ListenerStatus {
    pub fn conditions(&self, observed_generation: i64) -> Vec<Condition> {
        let mut conditions = vec![
            self.ready.render(observed_generation),
            self.detached.render(observed_generation),
            self.resolved_refs.render(observed_generation),
            self.conflicted.render(observed_generation),
        ];
        sort_conditions(&mut conditions);
        conditions
    }

    /// Invariant (spec.md §3, §8): `Ready.Invalid` iff any non-Ready aspect
    /// has an error, unless already explicitly set.
    pub fn reconcile_ready_invariant(&mut self) {
        if self.ready.is_invalid() {
            return;
        }
        let has_error = !matches!(self.detached, Detached::Attached)
            || !matches!(self.resolved_refs, ListenerResolvedRefs::ResolvedRefs)
            || !matches!(self.conflicted, Conflicted::NoConflicts);
        if has_error {
            self.ready = ListenerReady::Invalid("listener is in an invalid state".to_string());
        }
    }

    /// A listener is valid iff it carries no Ready.Invalid (spec.md §4.4 step 2).
    pub fn valid(&self) -> bool {
        !self.ready.is_invalid()
    }
}

/// Ephemeral per-listener state (spec.md §3).
pub struct ListenerState {
    pub spec: ListenerSpec,
    pub route_count: AtomicU32,
    pub resolved_tls: ResolvedTls,
    pub status: ListenerStatus,
}

impl ListenerState {
    pub fn new(spec: ListenerSpec) -> Self {
        Self {
            spec,
            route_count: AtomicU32::new(0),
            resolved_tls: ResolvedTls::default(),
            status: ListenerStatus::default(),
        }
    }

    pub fn route_count(&self) -> u32 {
        self.route_count.load(Ordering::SeqCst)
    }

    pub fn increment_route_count(&self) -> u32 {
        self.route_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn decrement_route_count(&self) -> u32 {
        self.route_count.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// spec.md §4.4 "TCP fan-out invariant". Re-runs the Ready invariant
    /// afterwards so a freshly-set `Conflicted.RouteConflict` is reflected in
    /// `Ready.Invalid`/`valid()` immediately (spec.md §3, §8 boundary
    /// scenario 4: `Valid() == false` for a TCP listener with two routes).
    pub fn apply_tcp_fanout_invariant(&mut self) {
        if matches!(self.spec.protocol, Protocol::Tcp) && self.route_count() > 1 {
            self.status.conflicted = Conflicted::RouteConflict;
        }
        self.status.reconcile_ready_invariant();
    }

    /// `status.listeners[]` entry for this listener (spec.md §3
    /// `ListenerStatus`, §6 cluster API surface).
    pub fn status_patch(&self, observed_generation: i64) -> (String, i32, Vec<Condition>) {
        (
            self.spec.name.clone(),
            self.route_count() as i32,
            self.status.conditions(observed_generation),
        )
    }
}

impl std::fmt::Debug for ListenerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerState")
            .field("spec", &self.spec)
            .field("route_count", &self.route_count())
            .field("status", &self.status)
            .finish()
    }
}
