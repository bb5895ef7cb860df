//! Concrete aspect records (spec.md §3, §4.2). Each wraps at most one
//! mutually-exclusive error slot, selected by whichever validator/binder step
//! set it; `render` turns that into the one `Condition` the aspect emits.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;

use super::{make_condition, STATUS_FALSE, STATUS_TRUE, STATUS_UNKNOWN};
use crate::consts::condition_types;

/// Gateway-level Scheduled aspect (spec.md §4.3 "Pod pass").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scheduled {
    #[default]
    Scheduled,
    NotReconciled,
    NoResources(String),
    PodFailed,
    Unknown,
}

impl Scheduled {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            Scheduled::Scheduled => (STATUS_TRUE, "Scheduled", "gateway pod is scheduled".into()),
            Scheduled::NotReconciled => (
                STATUS_FALSE,
                "NotReconciled",
                "gateway pod has not yet been reconciled".into(),
            ),
            Scheduled::NoResources(message) => (STATUS_FALSE, "NoResources", message.clone()),
            Scheduled::PodFailed => (
                STATUS_FALSE,
                "PodFailed",
                "gateway pod terminated unexpectedly".into(),
            ),
            Scheduled::Unknown => (
                STATUS_FALSE,
                "Unknown",
                "gateway pod phase could not be determined".into(),
            ),
        };
        make_condition(
            condition_types::SCHEDULED,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Gateway-level Ready aspect (spec.md §4.3 "Per-listener pass").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GatewayReady {
    #[default]
    Ready,
    AddressNotAssigned,
    ListenersNotValid,
    ListenersNotReady,
}

impl GatewayReady {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            GatewayReady::Ready => (STATUS_TRUE, "Ready", "gateway is ready".into()),
            GatewayReady::AddressNotAssigned => (
                STATUS_FALSE,
                "AddressNotAssigned",
                "gateway requested explicit addresses which are not supported".into(),
            ),
            GatewayReady::ListenersNotValid => (
                STATUS_FALSE,
                "ListenersNotValid",
                "one or more listeners are not valid".into(),
            ),
            GatewayReady::ListenersNotReady => (
                STATUS_FALSE,
                "ListenersNotReady",
                "gateway workload is not yet ready".into(),
            ),
        };
        make_condition(
            condition_types::READY,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Listener-level Ready aspect: `{Ready, Pending, Invalid}` (spec.md §4.7
/// "Listener Ready aspect" state machine). Invariant (spec.md §3, §8):
/// `Invalid` iff any other listener aspect carries an error, or explicitly
/// emitted; `Pending` is the initial state, before the gateway's pod/service
/// are both ready.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListenerReady {
    #[default]
    Pending,
    Ready,
    Invalid(String),
}

impl ListenerReady {
    pub fn is_invalid(&self) -> bool {
        matches!(self, ListenerReady::Invalid(_))
    }

    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            ListenerReady::Ready => (STATUS_TRUE, "Ready", "listener is ready".into()),
            ListenerReady::Pending => (
                STATUS_UNKNOWN,
                "Pending",
                "waiting for the gateway workload to become ready".into(),
            ),
            ListenerReady::Invalid(message) => (STATUS_FALSE, "Invalid", message.clone()),
        };
        make_condition(
            condition_types::READY,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Gateway-level InSync aspect (spec.md §4.6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InSync {
    #[default]
    InSync,
    SyncError(String),
}

impl InSync {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            InSync::InSync => (STATUS_TRUE, "InSync", "synced to downstream store".into()),
            InSync::SyncError(message) => (STATUS_FALSE, "SyncError", message.clone()),
        };
        make_condition(
            condition_types::IN_SYNC,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Listener-level Detached aspect (spec.md §4.3 "Unsupported addresses"/"Protocol").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Detached {
    #[default]
    Attached,
    UnsupportedAddress,
    UnsupportedProtocol,
}

impl Detached {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            Detached::Attached => (STATUS_FALSE, "Attached", "listener is attached".into()),
            Detached::UnsupportedAddress => (
                STATUS_TRUE,
                "UnsupportedAddress",
                "gateway requested addresses unsupported by this listener".into(),
            ),
            Detached::UnsupportedProtocol => (
                STATUS_TRUE,
                "UnsupportedProtocol",
                "listener protocol is not supported".into(),
            ),
        };
        make_condition(
            condition_types::DETACHED,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Listener-level Conflicted aspect (spec.md §4.3 "Listener-conflict pass", §4.4 TCP fan-out).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Conflicted {
    #[default]
    NoConflicts,
    ProtocolConflict,
    HostnameConflict,
    RouteConflict,
}

impl Conflicted {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            Conflicted::NoConflicts => (STATUS_FALSE, "NoConflicts", "no conflicts".into()),
            Conflicted::ProtocolConflict => (
                STATUS_TRUE,
                "ProtocolConflict",
                "multiple protocols on the same port".into(),
            ),
            Conflicted::HostnameConflict => (
                STATUS_TRUE,
                "HostnameConflict",
                "multiple hostnames on the same port".into(),
            ),
            Conflicted::RouteConflict => (
                STATUS_TRUE,
                "RouteConflict",
                "more than one route bound to this TCP listener".into(),
            ),
        };
        make_condition(
            condition_types::CONFLICTED,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Listener-level ResolvedRefs aspect (spec.md §4.3 "Protocol", "TLS").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListenerResolvedRefs {
    #[default]
    ResolvedRefs,
    InvalidRouteKinds(String),
    InvalidCertificateRef(String),
}

impl ListenerResolvedRefs {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            ListenerResolvedRefs::ResolvedRefs => {
                (STATUS_TRUE, "ResolvedRefs", "all references resolved".into())
            }
            ListenerResolvedRefs::InvalidRouteKinds(message) => {
                (STATUS_FALSE, "InvalidRouteKinds", message.clone())
            }
            ListenerResolvedRefs::InvalidCertificateRef(message) => {
                (STATUS_FALSE, "InvalidCertificateRef", message.clone())
            }
        };
        make_condition(
            condition_types::RESOLVED_REFS,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Route-parent-status Accepted aspect (spec.md §4.4 `OnBindFailed`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Accepted {
    #[default]
    Accepted,
    RouteKind,
    ListenerNamespacePolicy,
    HostnameMismatch,
    RouteInvalid(String),
}

impl Accepted {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            Accepted::Accepted => (STATUS_TRUE, "Accepted", "route was accepted".into()),
            Accepted::RouteKind => (
                STATUS_FALSE,
                "NotAllowedByListeners",
                "route kind is not allowed by this listener".into(),
            ),
            Accepted::ListenerNamespacePolicy => (
                STATUS_FALSE,
                "NotAllowedByListeners",
                "route namespace is not allowed by this listener".into(),
            ),
            Accepted::HostnameMismatch => (
                STATUS_FALSE,
                "NoMatchingListenerHostname",
                "no listener hostname matches the route".into(),
            ),
            Accepted::RouteInvalid(message) => (STATUS_FALSE, "RouteInvalid", message.clone()),
        };
        make_condition(
            condition_types::ACCEPTED,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

/// Route-parent-status ResolvedRefs aspect (spec.md §4.4 step 8, §7).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RouteResolvedRefs {
    #[default]
    ResolvedRefs,
    Errors(String),
    ConsulServiceNotFound(String),
    ServiceNotFound(String),
}

impl RouteResolvedRefs {
    pub fn render(&self, observed_generation: i64) -> Condition {
        let (status, reason, message) = match self {
            RouteResolvedRefs::ResolvedRefs => {
                (STATUS_TRUE, "ResolvedRefs", "all references resolved".into())
            }
            RouteResolvedRefs::Errors(message) => (STATUS_FALSE, "Errors", message.clone()),
            RouteResolvedRefs::ConsulServiceNotFound(message) => {
                (STATUS_FALSE, "ConsulServiceNotFound", message.clone())
            }
            RouteResolvedRefs::ServiceNotFound(message) => {
                (STATUS_FALSE, "ServiceNotFound", message.clone())
            }
        };
        make_condition(
            condition_types::RESOLVED_REFS,
            status,
            reason,
            message,
            observed_generation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_ready_invariant_tracks_invalid_variant() {
        assert!(!ListenerReady::Ready.is_invalid());
        assert!(!ListenerReady::Pending.is_invalid());
        assert!(ListenerReady::Invalid("bad".into()).is_invalid());
    }

    #[test]
    fn listener_ready_pending_renders_unknown() {
        assert_eq!(ListenerReady::Pending.render(1).status, STATUS_UNKNOWN);
        assert_eq!(ListenerReady::default(), ListenerReady::Pending);
    }

    #[test]
    fn base_conditions_use_declared_polarity() {
        assert_eq!(Conflicted::NoConflicts.render(1).status, STATUS_FALSE);
        assert_eq!(Conflicted::RouteConflict.render(1).status, STATUS_TRUE);
        assert_eq!(Detached::Attached.render(1).status, STATUS_FALSE);
        assert_eq!(Detached::UnsupportedProtocol.render(1).status, STATUS_TRUE);
    }

    #[test]
    fn observed_generation_is_stamped() {
        let c = Accepted::RouteKind.render(42);
        assert_eq!(c.observed_generation, Some(42));
    }
}
