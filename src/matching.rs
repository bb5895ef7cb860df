//! Matching primitives (spec.md §4.1, C1): hostname wildcarding, section-name
//! match, route-kind allowance, namespace selector evaluation, reference-grant
//! authorization. Pure functions — no I/O, no shared state.

use std::collections::BTreeMap;

use crate::model::listener::{AllowedRouteKind, NamespacePolicy};
use crate::model::reference_grant::ReferenceGrant;

/// Hostname match (spec.md §4.1). Symmetric and reflexive (spec.md §8).
pub fn hostname_match(a: &str, b: &str) -> bool {
    if a.is_empty() || a == "*" || b.is_empty() || b == "*" {
        return true;
    }
    let a_wild = a.starts_with("*.");
    let b_wild = b.starts_with("*.");
    if !a_wild && !b_wild {
        return a.eq_ignore_ascii_case(b);
    }
    let a_labels: Vec<&str> = a.split('.').collect();
    let b_labels: Vec<&str> = b.split('.').collect();
    if a_labels.len() != b_labels.len() {
        return false;
    }
    a_labels
        .iter()
        .zip(b_labels.iter())
        .skip(1)
        .all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// `routeMatches(listenerName, routeSection)` (spec.md §4.1).
/// Returns `(canBind, mustBind)`.
pub fn route_matches(listener_name: &str, route_section: Option<&str>) -> (bool, bool) {
    match route_section {
        None => (true, false),
        Some(section) => (listener_name == section, true),
    }
}

/// Route-kind allowance (spec.md §4.1).
pub fn route_kind_allowed(
    allowed: &[AllowedRouteKind],
    default_group: &str,
    route_group: &str,
    route_kind: &str,
) -> bool {
    if allowed.is_empty() {
        return true;
    }
    allowed.iter().any(|k| {
        let group = k.group.as_deref().unwrap_or(default_group);
        group == route_group && k.kind == route_kind
    })
}

/// Error returned by selector evaluation (spec.md §4.1 "Selector parse
/// failure yields a distinct error kind").
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespacePolicyError {
    #[error("namespace selector is malformed: {0}")]
    MalformedSelector(String),
}

/// Namespace policy evaluation (spec.md §4.1).
///
/// `route_namespace_labels` must already carry the implicit
/// `kubernetes.io/metadata.name` label equal to the namespace name — the
/// caller (validators) is responsible for augmenting it, matching how the
/// selector is evaluated against the fetched `Namespace` object.
pub fn namespace_policy_allows(
    policy: &NamespacePolicy,
    gateway_namespace: &str,
    route_namespace: &str,
    route_namespace_labels: &BTreeMap<String, String>,
) -> Result<bool, NamespacePolicyError> {
    match policy {
        NamespacePolicy::Same => Ok(gateway_namespace == route_namespace),
        NamespacePolicy::All => Ok(true),
        NamespacePolicy::Selector(selector) => {
            if selector.is_empty() {
                return Ok(true);
            }
            Ok(selector
                .iter()
                .all(|(k, v)| route_namespace_labels.get(k) == Some(v)))
        }
        NamespacePolicy::Unknown => Ok(false),
    }
}

/// Reference-grant authorization (spec.md §4.1). Same-namespace references
/// are always permitted; an unspecified target namespace is treated as
/// same-namespace.
pub fn reference_grant_authorized(
    grants: &[ReferenceGrant],
    from_group: &str,
    from_kind: &str,
    from_namespace: &str,
    to_group: &str,
    to_kind: &str,
    to_namespace: Option<&str>,
    to_name: &str,
) -> bool {
    let to_namespace = to_namespace.unwrap_or(from_namespace);
    if to_namespace == from_namespace {
        return true;
    }
    grants
        .iter()
        .filter(|g| g.namespace == to_namespace)
        .any(|g| g.authorizes(from_group, from_kind, from_namespace, to_group, to_kind, to_name))
}
