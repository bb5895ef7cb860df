/// One `(group, kind, namespace)` entry on either side of a `ReferenceGrant`
/// (spec.md §3). `None` name acts as a wildcard on the `To` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantFrom {
    pub group: String,
    pub kind: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantTo {
    pub group: String,
    pub kind: String,
    pub name: Option<String>,
}

/// A namespace-scoped cross-namespace reference authorization (spec.md §3).
#[derive(Debug, Clone)]
pub struct ReferenceGrant {
    /// Namespace the grant lives in — this is the *target* namespace of the
    /// references it authorizes (spec.md §4.1).
    pub namespace: String,
    pub from: Vec<GrantFrom>,
    pub to: Vec<GrantTo>,
}

impl ReferenceGrant {
    /// True if this grant authorizes a reference from `(group, kind, from_ns)`
    /// to `(to_group, to_kind, name)` (spec.md §4.1).
    pub fn authorizes(
        &self,
        from_group: &str,
        from_kind: &str,
        from_namespace: &str,
        to_group: &str,
        to_kind: &str,
        name: &str,
    ) -> bool {
        let from_matches = self
            .from
            .iter()
            .any(|f| f.group == from_group && f.kind == from_kind && f.namespace == from_namespace);
        let to_matches = self.to.iter().any(|t| {
            t.group == to_group
                && t.kind == to_kind
                && t.name.as_deref().map_or(true, |n| n == name)
        });
        from_matches && to_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> ReferenceGrant {
        ReferenceGrant {
            namespace: "secret-namespace".to_string(),
            from: vec![GrantFrom {
                group: "gateway.networking.k8s.io".to_string(),
                kind: "Gateway".to_string(),
                namespace: "gateway-namespace".to_string(),
            }],
            to: vec![GrantTo {
                group: "".to_string(),
                kind: "Secret".to_string(),
                name: None,
            }],
        }
    }

    #[test]
    fn wildcard_name_authorizes_any_target_name() {
        let g = grant();
        assert!(g.authorizes(
            "gateway.networking.k8s.io",
            "Gateway",
            "gateway-namespace",
            "",
            "Secret",
            "any-cert",
        ));
    }

    #[test]
    fn mismatched_from_namespace_is_denied() {
        let g = grant();
        assert!(!g.authorizes(
            "gateway.networking.k8s.io",
            "Gateway",
            "other-namespace",
            "",
            "Secret",
            "any-cert",
        ));
    }

    #[test]
    fn named_grant_rejects_other_names() {
        let mut g = grant();
        g.to[0].name = Some("only-this-cert".to_string());
        assert!(!g.authorizes(
            "gateway.networking.k8s.io",
            "Gateway",
            "gateway-namespace",
            "",
            "Secret",
            "any-cert",
        ));
        assert!(g.authorizes(
            "gateway.networking.k8s.io",
            "Gateway",
            "gateway-namespace",
            "",
            "Secret",
            "only-this-cert",
        ));
    }
}
