//! `ListenerValidator` (spec.md §4.3c).

use crate::consts;
use crate::error::CertificateError;
use crate::matching::reference_grant_authorized;
use crate::model::ids::NamespacedName;
use crate::model::listener::{Detached, ListenerState, Protocol, ResolvedTls};
use crate::model::reference_grant::ReferenceGrant;
use crate::status::aspect::{Conflicted, ListenerResolvedRefs};

/// Inputs the listener validator needs beyond the listener's own spec.
pub struct ListenerValidationContext<'a> {
    pub gateway_namespace: &'a str,
    pub gateway_requests_addresses: bool,
    pub reference_grants: &'a [ReferenceGrant],
    /// `Some(())` when the referenced secret exists; `None` means NotFound.
    pub certificate_secret_exists: bool,
}

/// Validates one listener in place, mutating its ephemeral status aspects
/// (spec.md §4.3c). Never fails — all failure modes are status slots.
pub fn validate_listener(state: &mut ListenerState, ctx: &ListenerValidationContext<'_>) {
    if ctx.gateway_requests_addresses {
        state.status.detached = Detached::UnsupportedAddress;
    }

    let supported_kinds = state.spec.protocol.supported_route_kinds();
    if supported_kinds.is_empty() {
        state.status.detached = Detached::UnsupportedProtocol;
    } else if !state.spec.allowed_kinds.is_empty() {
        let offending: Vec<&str> = state
            .spec
            .allowed_kinds
            .iter()
            .filter(|k| {
                let group = k.group.as_deref().unwrap_or(consts::GATEWAY_API_GROUP);
                group != consts::GATEWAY_API_GROUP || !supported_kinds.contains(&k.kind.as_str())
            })
            .map(|k| k.kind.as_str())
            .collect();
        if !offending.is_empty() {
            state.status.resolved_refs = ListenerResolvedRefs::InvalidRouteKinds(format!(
                "unsupported route kinds: {}",
                offending.join(", ")
            ));
        }
    }

    validate_tls(state, ctx);

    state.status.reconcile_ready_invariant();
}

fn validate_tls(state: &mut ListenerState, ctx: &ListenerValidationContext<'_>) {
    let requires_tls = state.spec.protocol.requires_tls();
    let Some(tls) = state.spec.tls.clone() else {
        if requires_tls {
            state.status.ready =
                crate::status::aspect::ListenerReady::Invalid("TLS config is required".to_string());
        }
        return;
    };

    if tls.passthrough {
        state.status.ready =
            crate::status::aspect::ListenerReady::Invalid("TLS passthrough is not supported".to_string());
        return;
    }

    if let Some(min_version) = &tls.min_version {
        if !consts::SUPPORTED_TLS_VERSIONS.contains(&min_version.as_str()) {
            state.status.ready = crate::status::aspect::ListenerReady::Invalid(
                "unrecognized TLS min version".to_string(),
            );
            return;
        }
    }
    if let Some(max_version) = &tls.max_version {
        if !consts::SUPPORTED_TLS_VERSIONS.contains(&max_version.as_str()) {
            state.status.ready = crate::status::aspect::ListenerReady::Invalid(
                "unrecognized TLS max version".to_string(),
            );
            return;
        }
    }
    if let Some(cipher_suites) = &tls.cipher_suites {
        let min_allows_ciphers = match tls.min_version.as_deref() {
            None | Some("TLS_AUTO") | Some("TLSv1_0") | Some("TLSv1_1") | Some("TLSv1_2") => true,
            _ => false,
        };
        if !min_allows_ciphers {
            state.status.ready = crate::status::aspect::ListenerReady::Invalid(
                "configuring cipher suites requires TLS min version <= 1.2".to_string(),
            );
            return;
        }
        for suite in cipher_suites.split(',').map(|s| s.trim()) {
            if !consts::SUPPORTED_CIPHER_SUITES.contains(&suite) {
                state.status.ready = crate::status::aspect::ListenerReady::Invalid(format!(
                    "unsupported cipher suite: {suite}"
                ));
                return;
            }
        }
    }

    if tls.certificate_refs.is_empty() {
        state.status.resolved_refs =
            ListenerResolvedRefs::InvalidCertificateRef("no certificateRefs configured".to_string());
        return;
    }

    let cert = &tls.certificate_refs[0];
    let group = cert.group.as_deref().unwrap_or("");
    let kind = cert.kind.as_deref().unwrap_or("Secret");
    if !group.is_empty() || kind != "Secret" {
        let err = CertificateError::Unsupported(group.to_string(), kind.to_string());
        state.status.resolved_refs =
            ListenerResolvedRefs::InvalidCertificateRef(err.to_string());
        return;
    }

    let cert_namespace = cert.namespace.as_deref().unwrap_or(ctx.gateway_namespace);
    if cert_namespace != ctx.gateway_namespace {
        let authorized = reference_grant_authorized(
            ctx.reference_grants,
            consts::GATEWAY_API_GROUP,
            "Gateway",
            ctx.gateway_namespace,
            "",
            "Secret",
            Some(cert_namespace),
            &cert.name,
        );
        if !authorized {
            state.status.resolved_refs = ListenerResolvedRefs::InvalidCertificateRef(
                "cross-namespace certificate reference not permitted by any ReferenceGrant"
                    .to_string(),
            );
            return;
        }
    }

    if !ctx.certificate_secret_exists {
        let err = CertificateError::NotFound(cert.name.clone());
        state.status.resolved_refs = ListenerResolvedRefs::InvalidCertificateRef(err.to_string());
        return;
    }

    state.resolved_tls = ResolvedTls {
        certificate_secret: Some(NamespacedName::new(cert_namespace, cert.name.clone())),
        min_version: tls.min_version.clone(),
        max_version: tls.max_version.clone(),
        cipher_suites: tls.cipher_suites.clone(),
        enabled: true,
    };
}

/// Listener-conflict pass across a gateway's listeners (spec.md §4.3 step 3).
pub fn apply_listener_conflicts(listeners: &mut [ListenerState]) {
    use std::collections::HashMap;

    let mut by_port: HashMap<u16, Vec<usize>> = HashMap::new();
    for (i, l) in listeners.iter().enumerate() {
        by_port.entry(l.spec.port).or_default().push(i);
    }

    for indices in by_port.values() {
        if indices.len() < 2 {
            continue;
        }
        let protocols: std::collections::HashSet<_> =
            indices.iter().map(|&i| format!("{:?}", listeners[i].spec.protocol)).collect();
        if protocols.len() > 1 {
            for &i in indices {
                listeners[i].status.conflicted = Conflicted::ProtocolConflict;
            }
        }
        let hostnames: std::collections::HashSet<_> = indices
            .iter()
            .filter_map(|&i| listeners[i].spec.hostname.clone())
            .collect();
        if hostnames.len() > 1 {
            for &i in indices {
                listeners[i].status.conflicted = Conflicted::HostnameConflict;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::listener::{ListenerSpec, ListenerTlsSpec, NamespacePolicy};

    fn base_spec(name: &str, port: u16, protocol: Protocol) -> ListenerSpec {
        ListenerSpec {
            ordinal: 0,
            name: name.to_string(),
            protocol,
            port,
            hostname: None,
            allowed_kinds: vec![],
            namespace_policy: NamespacePolicy::Same,
            tls: None,
        }
    }

    fn ctx() -> ListenerValidationContext<'static> {
        ListenerValidationContext {
            gateway_namespace: "default",
            gateway_requests_addresses: false,
            reference_grants: &[],
            certificate_secret_exists: true,
        }
    }

    #[test]
    fn udp_protocol_is_detached() {
        let mut state = ListenerState::new(base_spec("udp", 80, Protocol::Udp));
        validate_listener(&mut state, &ctx());
        assert!(matches!(state.status.detached, Detached::UnsupportedProtocol));
        assert!(state.status.ready.is_invalid());
    }

    #[test]
    fn https_without_tls_is_invalid() {
        let mut state = ListenerState::new(base_spec("https", 443, Protocol::Https));
        validate_listener(&mut state, &ctx());
        assert!(state.status.ready.is_invalid());
    }

    #[test]
    fn tls_min_version_boundary_scenario() {
        let mut spec = base_spec("https", 443, Protocol::Https);
        spec.tls = Some(ListenerTlsSpec {
            passthrough: false,
            certificate_refs: vec![crate::model::listener::CertificateRef {
                group: None,
                kind: None,
                name: "tls-cert".to_string(),
                namespace: None,
            }],
            min_version: Some("TLSv1_2".to_string()),
            max_version: None,
            cipher_suites: None,
        });
        let mut state = ListenerState::new(spec);
        validate_listener(&mut state, &ctx());
        assert!(!state.status.ready.is_invalid());
        assert_eq!(state.resolved_tls.min_version.as_deref(), Some("TLSv1_2"));

        let mut bad_spec = base_spec("https", 443, Protocol::Https);
        bad_spec.tls = Some(ListenerTlsSpec {
            passthrough: false,
            certificate_refs: vec![crate::model::listener::CertificateRef {
                group: None,
                kind: None,
                name: "tls-cert".to_string(),
                namespace: None,
            }],
            min_version: Some("foo".to_string()),
            max_version: None,
            cipher_suites: None,
        });
        let mut bad_state = ListenerState::new(bad_spec);
        validate_listener(&mut bad_state, &ctx());
        assert!(bad_state.status.ready.is_invalid());
        if let crate::status::aspect::ListenerReady::Invalid(message) = &bad_state.status.ready {
            assert_eq!(message, "unrecognized TLS min version");
        } else {
            panic!("expected Invalid");
        }
    }

    #[test]
    fn listener_protocol_conflict_boundary_scenario() {
        let mut listeners = vec![
            ListenerState::new(base_spec("a", 1, Protocol::Http)),
            ListenerState::new(base_spec("b", 1, Protocol::Udp)),
        ];
        apply_listener_conflicts(&mut listeners);
        assert!(matches!(
            listeners[0].status.conflicted,
            Conflicted::ProtocolConflict
        ));
        assert!(matches!(
            listeners[1].status.conflicted,
            Conflicted::ProtocolConflict
        ));
    }
}
