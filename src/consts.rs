// Stable names the rest of the crate must not drift from: the controller's
// identity, the annotation contract, and the condition Type strings every
// aspect (status.rs) emits under.

// controllerName gateways compare against when deciding who owns a GatewayClass.
pub const GATEWAY_CLASS_CONTROLLER_NAME: &str = "gateway.networking.k8s.io/mesh-gateway";

// Field manager used for every server-side apply patch this controller issues.
pub const FIELD_MANAGER: &str = "mesh-gateway-controller";

// controllerName recorded on every RouteParentStatus this controller writes,
// so status merging (status_updater.rs) can tell its own entries from a peer
// controller's.
pub const STATUS_CONTROLLER_NAME: &str = "gateway.networking.k8s.io/mesh-gateway";

// Base annotation prefix for the class-config pin and per-listener TLS overrides.
pub const ANNOTATION_PREFIX: &str = "gateway.networking.k8s.io/mesh-gateway";

pub fn config_annotation() -> String {
    format!("{ANNOTATION_PREFIX}/config")
}

pub fn tls_min_version_annotation() -> String {
    format!("{ANNOTATION_PREFIX}/tls_min_version")
}

pub fn tls_max_version_annotation() -> String {
    format!("{ANNOTATION_PREFIX}/tls_max_version")
}

pub fn tls_cipher_suites_annotation() -> String {
    format!("{ANNOTATION_PREFIX}/tls_cipher_suites")
}

// Condition Type strings (spec §6). Stable; never renamed.
pub mod condition_types {
    pub const SCHEDULED: &str = "Scheduled";
    pub const READY: &str = "Ready";
    pub const IN_SYNC: &str = "InSync";
    pub const ACCEPTED: &str = "Accepted";
    pub const RESOLVED_REFS: &str = "ResolvedRefs";
    pub const CONFLICTED: &str = "Conflicted";
    pub const DETACHED: &str = "Detached";
}

// The default group assumed for a route/backend reference that omits `group`.
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";

// Key used inside the downstream CA bundle secret.
pub const CA_BUNDLE_SECRET_KEY: &str = "consul-ca-cert";

// TLS min/max version values the listener validator accepts.
pub const SUPPORTED_TLS_VERSIONS: &[&str] =
    &["TLS_AUTO", "TLSv1_0", "TLSv1_1", "TLSv1_2", "TLSv1_3"];

// Cipher suite allow-list.
pub const SUPPORTED_CIPHER_SUITES: &[&str] = &[
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305",
    "TLS_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_RSA_WITH_AES_256_GCM_SHA384",
];
