use std::fmt;

/// A namespace/name pair, used as a map key throughout the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Identity of a Gateway: its namespace/name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GatewayId(pub NamespacedName);

impl GatewayId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self(NamespacedName::new(namespace, name))
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A route's kind, used to build its external identity encoding
/// (`http-<ns>/<name>` / `tcp-<ns>/<name>`, spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Http,
    Tcp,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Http => write!(f, "http"),
            RouteKind::Tcp => write!(f, "tcp"),
        }
    }
}

/// Identity of a route: its kind plus namespace/name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteId {
    pub kind: RouteKind,
    pub name: NamespacedName,
}

impl RouteId {
    pub fn new(kind: RouteKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: NamespacedName::new(namespace, name),
        }
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_id_encodes_kind_prefix() {
        let id = RouteId::new(RouteKind::Http, "default", "my-route");
        assert_eq!(id.to_string(), "http-default/my-route");

        let id = RouteId::new(RouteKind::Tcp, "default", "my-route");
        assert_eq!(id.to_string(), "tcp-default/my-route");
    }

    #[test]
    fn namespaced_name_equality_ignores_nothing_else() {
        let a = NamespacedName::new("ns", "name");
        let b = NamespacedName::new("ns", "name");
        assert_eq!(a, b);
    }
}
