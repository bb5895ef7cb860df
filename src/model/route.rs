use ahash::AHashMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;

use crate::error::ResolutionError;
use crate::status::aspect::{Accepted, RouteResolvedRefs};
use crate::status::sort_conditions;

/// A backend reference on a route rule (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRef {
    pub group: Option<String>,
    pub kind: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
    pub port: Option<u16>,
}

/// A route rule: backends plus, for HTTP, matches/filters opaque to the core
/// (spec.md §3 — the core only needs enough of a rule to key resolved refs).
#[derive(Debug, Clone, Default)]
pub struct RouteRule {
    pub backend_refs: Vec<BackendRef>,
}

/// A parent reference on a route (spec.md §3, §6).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentRef {
    pub group: Option<String>,
    pub kind: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
    pub section_name: Option<String>,
}

impl ParentRef {
    /// Canonical-JSON encoding used as a map key (spec.md §6).
    pub fn canonical_key(&self) -> String {
        serde_json::json!({
            "group": self.group,
            "kind": self.kind,
            "namespace": self.namespace,
            "name": self.name,
            "sectionName": self.section_name,
        })
        .to_string()
    }
}

/// HTTP-only route fields (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct HttpRouteData {
    pub hostnames: Vec<String>,
}

/// Tagged variant over HTTP and TCP routes (spec.md §3, §9 "tagged variants").
#[derive(Debug, Clone)]
pub enum Route {
    Http {
        parent_refs: Vec<ParentRef>,
        rules: Vec<RouteRule>,
        http: HttpRouteData,
    },
    Tcp {
        parent_refs: Vec<ParentRef>,
        rules: Vec<RouteRule>,
    },
}

impl Route {
    pub fn parent_refs(&self) -> &[ParentRef] {
        match self {
            Route::Http { parent_refs, .. } => parent_refs,
            Route::Tcp { parent_refs, .. } => parent_refs,
        }
    }

    pub fn rules(&self) -> &[RouteRule] {
        match self {
            Route::Http { rules, .. } => rules,
            Route::Tcp { rules, .. } => rules,
        }
    }

    pub fn hostnames(&self) -> &[String] {
        match self {
            Route::Http { http, .. } => &http.hostnames,
            Route::Tcp { .. } => &[],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Route::Http { .. } => "HTTPRoute",
            Route::Tcp { .. } => "TCPRoute",
        }
    }
}

/// Per-parent status slots (spec.md §3 `ParentStatuses`).
#[derive(Debug, Clone, Default)]
pub struct ParentStatus {
    pub accepted: Accepted,
    pub resolved_refs: RouteResolvedRefs,
    pub controller_name: String,
}

impl ParentStatus {
    pub fn conditions(&self, observed_generation: i64) -> Vec<Condition> {
        let mut conditions = vec![
            self.accepted.render(observed_generation),
            self.resolved_refs.render(observed_generation),
        ];
        sort_conditions(&mut conditions);
        conditions
    }
}

/// Ephemeral per-route state (spec.md §3). Rebuilt each reconcile.
#[derive(Debug, Clone, Default)]
pub struct RouteState {
    pub resolution_errors: Vec<ResolutionError>,
    /// Keyed by a string derived from the owning rule (spec.md §4.3 RouteValidator).
    pub resolved_refs: AHashMap<String, Vec<BackendRef>>,
    /// Keyed by `ParentRef::canonical_key()`.
    pub parent_statuses: AHashMap<String, ParentStatus>,
}

impl RouteState {
    /// Invariant (spec.md §3, §8): a route is valid iff its resolution-error
    /// set is empty.
    pub fn valid(&self) -> bool {
        self.resolution_errors.is_empty()
    }

    pub fn push_error(&mut self, error: ResolutionError) {
        self.resolution_errors.push(error);
    }

    /// Flattens the resolution-error accumulator into one `ResolvedRefs.*`
    /// slot, preferring the first Consul-not-found or service-not-found
    /// error encountered, else a generic `Errors` slot (spec.md §4.4 step 8,
    /// §7).
    pub fn flatten_resolved_refs(&self) -> RouteResolvedRefs {
        if self.resolution_errors.is_empty() {
            return RouteResolvedRefs::ResolvedRefs;
        }
        for error in &self.resolution_errors {
            match error {
                ResolutionError::ConsulServiceNotFound { message } => {
                    return RouteResolvedRefs::ConsulServiceNotFound(message.clone());
                }
                ResolutionError::ServiceNotFound { message } => {
                    return RouteResolvedRefs::ServiceNotFound(message.clone());
                }
                _ => {}
            }
        }
        let joined = self
            .resolution_errors
            .iter()
            .map(|e| e.message().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        RouteResolvedRefs::Errors(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_iff_resolution_errors_empty() {
        let mut state = RouteState::default();
        assert!(state.valid());
        state.push_error(ResolutionError::Other {
            message: "boom".into(),
        });
        assert!(!state.valid());
    }

    #[test]
    fn flatten_prefers_service_not_found_over_generic() {
        let mut state = RouteState::default();
        state.push_error(ResolutionError::Other {
            message: "generic".into(),
        });
        state.push_error(ResolutionError::ServiceNotFound {
            message: "svc gone".into(),
        });
        assert!(matches!(
            state.flatten_resolved_refs(),
            RouteResolvedRefs::ServiceNotFound(_)
        ));
    }

    #[test]
    fn parent_ref_canonical_key_roundtrips_identity() {
        let parent = ParentRef {
            group: Some("gateway.networking.k8s.io".into()),
            kind: Some("Gateway".into()),
            namespace: Some("default".into()),
            name: "gw".into(),
            section_name: None,
        };
        let key_a = parent.canonical_key();
        let key_b = parent.clone().canonical_key();
        assert_eq!(key_a, key_b);
    }
}
