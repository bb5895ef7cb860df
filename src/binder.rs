//! The binder (spec.md §4.4, C4): decides whether a route may attach to
//! each listener of a gateway.

use crate::error::BindError;
use crate::matching::{hostname_match, namespace_policy_allows, route_kind_allowed, route_matches};
use crate::model::gateway::GatewayState;
use crate::model::route::{ParentStatus, Route, RouteState};
use crate::status::aspect::Accepted;

/// Context the binder needs about the route's own namespace (for the
/// namespace-selector check) beyond what's already on `Route`/`RouteState`.
pub struct BindContext<'a> {
    pub route_namespace: &'a str,
    pub route_namespace_labels: &'a std::collections::BTreeMap<String, String>,
    pub gateway_namespace: &'a str,
    pub gateway_name: &'a str,
}

/// `Bind(ctx, gateway, route)` (spec.md §4.4). Returns true iff the route
/// bound to at least one listener.
///
/// Only parent references that target `ctx.gateway_namespace`/`gateway_name`
/// are considered — a route's other parent refs (pointing at different
/// gateways) are left untouched so a caller can bind the same route against
/// several gateways, one call per gateway, without cross-contaminating their
/// parent-status entries.
pub fn bind(gateway: &mut GatewayState, route: &Route, route_state: &mut RouteState, ctx: &BindContext<'_>) -> bool {
    let mut bound_any = false;

    for parent in route.parent_refs() {
        let parent_namespace = parent.namespace.as_deref().unwrap_or(ctx.route_namespace);
        if parent.name != ctx.gateway_name || parent_namespace != ctx.gateway_namespace {
            continue;
        }
        let parent_key = parent.canonical_key();
        let mut parent_status = route_state
            .parent_statuses
            .remove(&parent_key)
            .unwrap_or_default();
        let mut parent_bound = false;
        let mut last_failure: Option<BindError> = None;
        let mut attempted_required = false;

        for listener in gateway.listeners.iter_mut() {
            let (can_bind, must_bind) = route_matches(&listener.spec.name, parent.section_name.as_deref());
            if !can_bind {
                continue;
            }
            if must_bind {
                attempted_required = true;
            }

            if listener.status.ready.is_invalid() {
                if must_bind {
                    last_failure = Some(BindError::RouteInvalid(
                        "listener is not ready to accept routes".to_string(),
                    ));
                }
                continue;
            }

            let route_group = crate::consts::GATEWAY_API_GROUP;
            if !route_kind_allowed(&listener.spec.allowed_kinds, route_group, route_group, route.kind_name()) {
                if must_bind {
                    last_failure = Some(BindError::RouteKind);
                }
                continue;
            }

            let namespace_allowed = namespace_policy_allows(
                &listener.spec.namespace_policy,
                ctx.gateway_namespace,
                ctx.route_namespace,
                ctx.route_namespace_labels,
            )
            .unwrap_or(false);
            if !namespace_allowed {
                if must_bind {
                    last_failure = Some(BindError::ListenerNamespacePolicy);
                }
                continue;
            }

            if matches!(route, Route::Http { .. }) {
                let hostnames = route.hostnames();
                if !hostnames.is_empty() {
                    let listener_hostname = listener.spec.hostname.as_deref().unwrap_or("*");
                    let any_match = hostnames.iter().any(|h| hostname_match(h, listener_hostname));
                    if !any_match {
                        if must_bind {
                            last_failure = Some(BindError::HostnameMismatch);
                        }
                        continue;
                    }
                }
            }

            let protocol_ok = match route {
                Route::Tcp { .. } => matches!(listener.spec.protocol, crate::model::listener::Protocol::Tcp),
                Route::Http { .. } => matches!(
                    listener.spec.protocol,
                    crate::model::listener::Protocol::Http | crate::model::listener::Protocol::Https
                ),
            };
            if !protocol_ok {
                if must_bind {
                    last_failure = Some(BindError::RouteKind);
                }
                continue;
            }

            listener.increment_route_count();
            listener.apply_tcp_fanout_invariant();
            parent_status.accepted = Accepted::Accepted;
            parent_status.resolved_refs = route_state.flatten_resolved_refs();
            parent_bound = true;
            bound_any = true;
        }

        if !parent_bound {
            let failure = last_failure.unwrap_or_else(|| {
                if attempted_required {
                    BindError::RouteKind
                } else {
                    BindError::RouteInvalid("no listener on this gateway matched".to_string())
                }
            });
            on_bind_failed(&mut parent_status, &failure, route_state);
        }

        parent_status.controller_name = crate::consts::STATUS_CONTROLLER_NAME.to_string();
        route_state.parent_statuses.insert(parent_key, parent_status);
    }

    bound_any
}

/// `OnBindFailed` (spec.md §4.4 step 8).
fn on_bind_failed(parent_status: &mut ParentStatus, error: &BindError, route_state: &RouteState) {
    parent_status.accepted = match error {
        BindError::RouteKind => Accepted::RouteKind,
        BindError::ListenerNamespacePolicy => Accepted::ListenerNamespacePolicy,
        BindError::HostnameMismatch => Accepted::HostnameMismatch,
        BindError::RouteInvalid(message) => Accepted::RouteInvalid(message.clone()),
    };
    parent_status.resolved_refs = route_state.flatten_resolved_refs();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::listener::{ListenerSpec, ListenerState, NamespacePolicy, Protocol};
    use crate::model::route::{HttpRouteData, ParentRef, RouteRule};

    fn gateway_with_listener(name: &str, protocol: Protocol, policy: NamespacePolicy) -> GatewayState {
        let spec = ListenerSpec {
            ordinal: 0,
            name: name.to_string(),
            protocol,
            port: 80,
            hostname: None,
            allowed_kinds: vec![],
            namespace_policy: policy,
            tls: None,
        };
        GatewayState::new(1, vec![ListenerState::new(spec)])
    }

    fn http_route(section_name: Option<&str>) -> Route {
        Route::Http {
            parent_refs: vec![ParentRef {
                group: None,
                kind: None,
                namespace: Some("default".to_string()),
                name: "gw".to_string(),
                section_name: section_name.map(str::to_string),
            }],
            rules: vec![RouteRule { backend_refs: vec![] }],
            http: HttpRouteData::default(),
        }
    }

    fn ctx() -> BindContext<'static> {
        BindContext {
            route_namespace: "default",
            route_namespace_labels: &std::collections::BTreeMap::new(),
            gateway_namespace: "default",
            gateway_name: "gw",
        }
    }

    #[test]
    fn ignores_parent_refs_targeting_a_different_gateway() {
        let mut gateway = gateway_with_listener("http", Protocol::Http, NamespacePolicy::Same);
        let route = Route::Http {
            parent_refs: vec![ParentRef {
                group: None,
                kind: None,
                namespace: Some("default".to_string()),
                name: "some-other-gw".to_string(),
                section_name: None,
            }],
            rules: vec![RouteRule { backend_refs: vec![] }],
            http: HttpRouteData::default(),
        };
        let mut route_state = RouteState::default();
        assert!(!bind(&mut gateway, &route, &mut route_state, &ctx()));
        assert_eq!(gateway.listeners[0].route_count(), 0);
        assert!(route_state.parent_statuses.is_empty());
    }

    #[test]
    fn binds_to_matching_listener_by_section_name() {
        let mut gateway = gateway_with_listener("http", Protocol::Http, NamespacePolicy::Same);
        let route = http_route(Some("http"));
        let mut route_state = RouteState::default();
        let ctx = ctx();
        assert!(bind(&mut gateway, &route, &mut route_state, &ctx));
        assert_eq!(gateway.listeners[0].route_count(), 1);
    }

    #[test]
    fn rejects_wrong_section_name() {
        let mut gateway = gateway_with_listener("other", Protocol::Http, NamespacePolicy::Same);
        let route = http_route(Some("http"));
        let mut route_state = RouteState::default();
        let ctx = ctx();
        assert!(!bind(&mut gateway, &route, &mut route_state, &ctx));
        assert_eq!(gateway.listeners[0].route_count(), 0);
        let parent_key = route.parent_refs()[0].canonical_key();
        assert!(matches!(
            route_state.parent_statuses[&parent_key].accepted,
            Accepted::RouteKind
        ));
    }

    #[test]
    fn tcp_fanout_second_bind_still_admits_but_conflicts() {
        let mut gateway = gateway_with_listener("tcp", Protocol::Tcp, NamespacePolicy::Same);
        let route = Route::Tcp {
            parent_refs: vec![ParentRef {
                group: None,
                kind: None,
                namespace: Some("default".to_string()),
                name: "gw".to_string(),
                section_name: None,
            }],
            rules: vec![RouteRule { backend_refs: vec![] }],
        };
        let mut state_a = RouteState::default();
        let mut state_b = RouteState::default();
        let ctx = ctx();
        assert!(bind(&mut gateway, &route, &mut state_a, &ctx));
        assert!(bind(&mut gateway, &route, &mut state_b, &ctx));
        assert_eq!(gateway.listeners[0].route_count(), 2);
        assert!(matches!(
            gateway.listeners[0].status.conflicted,
            crate::status::aspect::Conflicted::RouteConflict
        ));
        assert!(!gateway.listeners[0].status.valid());
    }
}
