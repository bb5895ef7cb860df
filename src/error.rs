use thiserror::Error;

/// Errors surfaced across the reconciliation core.
///
/// Resolution, authorization and validation failures are *not* represented
/// here: per spec.md §7 those are locally recovered and live only as fields
/// on `RouteState`/`ListenerState`/`GatewayState`. Only infrastructure
/// failures, bind failures and certificate-resolution failures are ever
/// returned as `Err` from a core entry point.
#[derive(Error, Debug)]
pub enum Error {
    #[error("kube error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("invalid configuration: `{0}`")]
    InvalidConfig(String),

    #[error("downstream store error: `{0}`")]
    Store(String),

    #[error("mesh namespace-ensure error: `{0}`")]
    Mesh(String),

    #[error("deploy error: `{0}`")]
    Deploy(String),

    #[error("error querying Gateway API CRDs: `{0}`; are the CRDs installed?")]
    CrdNotFound(#[source] kube::Error),

    #[error("missing resource namespace")]
    MissingNamespace,

    #[error("missing resource name")]
    MissingName,

    #[error("missing resource generation")]
    MissingGeneration,

    #[error("reconcile cancelled")]
    Cancelled,

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Bind failures (spec.md §4.4, §7). Each variant maps to one `Accepted.*`
/// condition slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("route kind not allowed by listener")]
    RouteKind,
    #[error("listener namespace policy does not allow this route's namespace")]
    ListenerNamespacePolicy,
    #[error("no hostname on the route matches the listener's hostname")]
    HostnameMismatch,
    #[error("route is not valid: {0}")]
    RouteInvalid(String),
}

/// Certificate resolution failures (spec.md §4.3, §7). Both map to
/// `ResolvedRefs.InvalidCertificateRef`, distinguished by reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    #[error("certificate secret {0} not found")]
    NotFound(String),
    #[error("unsupported certificate reference group/kind: {0}/{1}")]
    Unsupported(String, String),
}

/// Resolution errors accumulated on a route (spec.md §3, §4.3, §7). These
/// never surface as `Error`; they are flattened into a `ResolvedRefs.*` slot
/// at bind time (spec.md §4.4 step 8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A cross-namespace reference was not permitted by any `ReferenceGrant`.
    RefNotPermitted { message: String },
    /// The external backend resolver reported the backend could not be found
    /// in the downstream mesh's service catalog (e.g. Consul).
    ConsulServiceNotFound { message: String },
    /// The backend reference points at a Kubernetes `Service` that does not exist.
    ServiceNotFound { message: String },
    /// Any other resolution failure (malformed rule, unsupported backend kind, ...).
    Other { message: String },
}

impl ResolutionError {
    pub fn message(&self) -> &str {
        match self {
            ResolutionError::RefNotPermitted { message }
            | ResolutionError::ConsulServiceNotFound { message }
            | ResolutionError::ServiceNotFound { message }
            | ResolutionError::Other { message } => message,
        }
    }
}

impl std::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
