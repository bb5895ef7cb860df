//! Conversions between the real Gateway API wire types (the `gateway-api`
//! crate) and this crate's own domain model. Deliberately concentrated in one
//! file: everywhere else works exclusively in terms of `model::*` types.

use std::collections::BTreeMap;

use gateway_api::apis::experimental::referencegrants::{ReferenceGrant as ApiReferenceGrant, ReferenceGrantFrom, ReferenceGrantTo};
use gateway_api::apis::experimental::tcproutes::{TCPRoute, TCPRouteParentRefs, TCPRouteRulesBackendRefs};
use gateway_api::apis::standard::gateways::{
    Gateway, GatewayListeners, GatewayListenersAllowedRoutesKinds, GatewayListenersProtocol,
    GatewayListenersTls, GatewayListenersTlsMode,
};
use gateway_api::apis::standard::httproutes::{
    HTTPRoute, HTTPRouteParentRefs, HTTPRouteRulesBackendRefs,
};

use crate::consts::GATEWAY_API_GROUP;
use crate::model::listener::{
    AllowedRouteKind, CertificateRef, ListenerSpec, ListenerState, NamespacePolicy, Protocol,
};
use crate::model::reference_grant::{GrantFrom, GrantTo, ReferenceGrant};
use crate::model::route::{BackendRef, HttpRouteData, ParentRef, Route, RouteRule};

pub fn reference_grant_from_api(namespace: &str, grant: ApiReferenceGrant) -> ReferenceGrant {
    let spec = grant.spec;
    ReferenceGrant {
        namespace: namespace.to_string(),
        from: spec
            .from
            .into_iter()
            .map(|f: ReferenceGrantFrom| GrantFrom {
                group: f.group,
                kind: f.kind,
                namespace: f.namespace,
            })
            .collect(),
        to: spec
            .to
            .into_iter()
            .map(|t: ReferenceGrantTo| GrantTo {
                group: t.group,
                kind: t.kind,
                name: t.name,
            })
            .collect(),
    }
}

fn protocol_from_api(protocol: &GatewayListenersProtocol) -> Protocol {
    match protocol {
        GatewayListenersProtocol::HTTP => Protocol::Http,
        GatewayListenersProtocol::HTTPS => Protocol::Https,
        GatewayListenersProtocol::TCP => Protocol::Tcp,
        GatewayListenersProtocol::UDP => Protocol::Udp,
        _ => Protocol::Udp,
    }
}

fn namespace_policy_from_api(listener: &GatewayListeners) -> NamespacePolicy {
    let Some(allowed) = &listener.allowed_routes else {
        return NamespacePolicy::Same;
    };
    let Some(namespaces) = &allowed.namespaces else {
        return NamespacePolicy::Same;
    };
    match namespaces.from.as_deref() {
        Some("All") => NamespacePolicy::All,
        Some("Same") | None => NamespacePolicy::Same,
        Some("Selector") => {
            let labels = namespaces
                .selector
                .as_ref()
                .and_then(|s| s.match_labels.clone())
                .map(|m| m.into_iter().collect::<BTreeMap<_, _>>())
                .unwrap_or_default();
            NamespacePolicy::Selector(labels)
        }
        _ => NamespacePolicy::Unknown,
    }
}

fn allowed_kinds_from_api(listener: &GatewayListeners) -> Vec<AllowedRouteKind> {
    listener
        .allowed_routes
        .as_ref()
        .and_then(|a| a.kinds.clone())
        .unwrap_or_default()
        .into_iter()
        .map(|k: GatewayListenersAllowedRoutesKinds| AllowedRouteKind {
            group: k.group,
            kind: k.kind,
        })
        .collect()
}

fn tls_from_api(tls: &GatewayListenersTls) -> crate::model::listener::ListenerTlsSpec {
    let passthrough = matches!(tls.mode, Some(GatewayListenersTlsMode::Passthrough));
    let certificate_refs = tls
        .certificate_refs
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|c| CertificateRef {
            group: c.group,
            kind: c.kind,
            name: c.name,
            namespace: c.namespace,
        })
        .collect();
    let options = tls.options.clone().unwrap_or_default();
    let min_version = options
        .get(&format!("{}/tls_min_version", GATEWAY_API_GROUP))
        .cloned();
    let max_version = options
        .get(&format!("{}/tls_max_version", GATEWAY_API_GROUP))
        .cloned();
    let cipher_suites = options
        .get(&format!("{}/tls_cipher_suites", GATEWAY_API_GROUP))
        .cloned();
    crate::model::listener::ListenerTlsSpec {
        passthrough,
        certificate_refs,
        min_version,
        max_version,
        cipher_suites,
    }
}

pub fn listener_states_from_gateway(gateway: &Gateway) -> Vec<ListenerState> {
    gateway
        .spec
        .listeners
        .iter()
        .enumerate()
        .map(|(ordinal, listener)| {
            let spec = ListenerSpec {
                ordinal,
                name: listener.name.clone(),
                protocol: protocol_from_api(&listener.protocol),
                port: listener.port as u16,
                hostname: listener.hostname.clone(),
                allowed_kinds: allowed_kinds_from_api(listener),
                namespace_policy: namespace_policy_from_api(listener),
                tls: listener.tls.as_ref().map(tls_from_api),
            };
            ListenerState::new(spec)
        })
        .collect()
}

fn parent_ref_from_http(p: &HTTPRouteParentRefs) -> ParentRef {
    ParentRef {
        group: p.group.clone(),
        kind: p.kind.clone(),
        namespace: p.namespace.clone(),
        name: p.name.clone(),
        section_name: p.section_name.clone(),
    }
}

fn parent_ref_from_tcp(p: &TCPRouteParentRefs) -> ParentRef {
    ParentRef {
        group: p.group.clone(),
        kind: p.kind.clone(),
        namespace: p.namespace.clone(),
        name: p.name.clone(),
        section_name: p.section_name.clone(),
    }
}

fn backend_ref_from_http(b: &HTTPRouteRulesBackendRefs) -> BackendRef {
    BackendRef {
        group: b.group.clone(),
        kind: b.kind.clone(),
        name: b.name.clone(),
        namespace: b.namespace.clone(),
        port: b.port.map(|p| p as u16),
    }
}

fn backend_ref_from_tcp(b: &TCPRouteRulesBackendRefs) -> BackendRef {
    BackendRef {
        group: b.group.clone(),
        kind: b.kind.clone(),
        name: b.name.clone(),
        namespace: b.namespace.clone(),
        port: b.port.map(|p| p as u16),
    }
}

pub fn route_from_http_route(route: &HTTPRoute) -> Route {
    let parent_refs = route
        .spec
        .parent_refs
        .clone()
        .unwrap_or_default()
        .iter()
        .map(parent_ref_from_http)
        .collect();
    let rules = route
        .spec
        .rules
        .clone()
        .unwrap_or_default()
        .iter()
        .map(|r| RouteRule {
            backend_refs: r
                .backend_refs
                .clone()
                .unwrap_or_default()
                .iter()
                .map(backend_ref_from_http)
                .collect(),
        })
        .collect();
    let hostnames = route.spec.hostnames.clone().unwrap_or_default();
    Route::Http {
        parent_refs,
        rules,
        http: HttpRouteData { hostnames },
    }
}

pub fn route_from_tcp_route(route: &TCPRoute) -> Route {
    let parent_refs = route
        .spec
        .parent_refs
        .clone()
        .unwrap_or_default()
        .iter()
        .map(parent_ref_from_tcp)
        .collect();
    let rules = route
        .spec
        .rules
        .iter()
        .map(|r| RouteRule {
            backend_refs: r
                .backend_refs
                .clone()
                .unwrap_or_default()
                .iter()
                .map(backend_ref_from_tcp)
                .collect(),
        })
        .collect();
    Route::Tcp { parent_refs, rules }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_ref_conversion_preserves_section_name() {
        let api = HTTPRouteParentRefs {
            group: None,
            kind: Some("Gateway".to_string()),
            namespace: Some("default".to_string()),
            name: "gw".to_string(),
            section_name: Some("https".to_string()),
            port: None,
        };
        let converted = parent_ref_from_http(&api);
        assert_eq!(converted.section_name.as_deref(), Some("https"));
        assert_eq!(converted.name, "gw");
    }
}
