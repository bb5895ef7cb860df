//! `GatewayValidator` (spec.md §4.3).

use std::collections::BTreeMap;

use crate::cluster_api::ClusterApiClient;
use crate::error::{Error, Result};
use crate::model::gateway::GatewayState;
use crate::model::listener::ListenerState;
use crate::model::reference_grant::ReferenceGrant;
use crate::status::aspect::Scheduled;

use super::listener::{apply_listener_conflicts, validate_listener, ListenerValidationContext};

/// The `spec.addresses[*].type`/`ClusterIP`/`NodePort`/unset dispatch used by
/// the IP-assignment pass (spec.md §4.3 step 5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceType {
    LoadBalancer,
    ClusterIp,
    NodePort,
    Unset,
    Other(String),
}

pub struct GatewayValidationInput<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub generation: i64,
    pub listeners: Vec<ListenerState>,
    pub requested_addresses: bool,
    pub pod_name: Option<&'a str>,
    pub service_name: &'a str,
    pub service_type: ServiceType,
    pub reference_grants: &'a [ReferenceGrant],
    /// For each listener needing a certificate, whether the secret exists.
    pub certificate_secret_exists: Vec<bool>,
}

pub async fn validate_gateway(
    input: GatewayValidationInput<'_>,
    cluster: &dyn ClusterApiClient,
) -> Result<GatewayState> {
    let mut listeners = input.listeners;
    let mut state = GatewayState::new(input.generation, Vec::new());

    if input.requested_addresses {
        state.status.ready = crate::status::aspect::GatewayReady::AddressNotAssigned;
    }

    apply_listener_conflicts(&mut listeners);

    match input.pod_name {
        None => state.status.scheduled = Scheduled::NotReconciled,
        Some(pod_name) => match cluster.get_pod(input.namespace, pod_name).await? {
            None => state.status.scheduled = Scheduled::NotReconciled,
            Some(pod) => apply_pod_phase(&mut state, &pod),
        },
    }

    match input.service_type {
        ServiceType::LoadBalancer => {
            match cluster.get_service(input.namespace, input.service_name).await? {
                None => state.status.scheduled = Scheduled::NotReconciled,
                Some(service) => {
                    let ingress = service
                        .status
                        .as_ref()
                        .and_then(|s| s.load_balancer.as_ref())
                        .and_then(|lb| lb.ingress.clone())
                        .unwrap_or_default();
                    for i in &ingress {
                        if let Some(ip) = &i.ip {
                            state.addresses.push(ip.clone());
                        }
                    }
                    state.service_ready = !ingress.is_empty();
                }
            }
        }
        ServiceType::ClusterIp => {
            match cluster.get_service(input.namespace, input.service_name).await? {
                None => state.status.scheduled = Scheduled::NotReconciled,
                Some(service) => {
                    if let Some(cluster_ip) = service.spec.as_ref().and_then(|s| s.cluster_ip.clone())
                    {
                        if !cluster_ip.is_empty() {
                            state.addresses.push(cluster_ip);
                            state.service_ready = true;
                        }
                    }
                }
            }
        }
        ServiceType::NodePort => {
            if let Some(pod_name) = input.pod_name {
                match cluster.get_pod(input.namespace, pod_name).await? {
                    None => state.status.scheduled = Scheduled::NotReconciled,
                    Some(pod) => {
                        if let Some(host_ip) = pod.status.as_ref().and_then(|s| s.host_ip.clone()) {
                            state.addresses.push(host_ip);
                            state.service_ready = true;
                        }
                    }
                }
            }
        }
        ServiceType::Unset => {
            if let Some(pod_name) = input.pod_name {
                match cluster.get_pod(input.namespace, pod_name).await? {
                    None => state.status.scheduled = Scheduled::NotReconciled,
                    Some(pod) => {
                        if let Some(pod_ip) = pod.status.as_ref().and_then(|s| s.pod_ip.clone()) {
                            state.addresses.push(pod_ip);
                            state.service_ready = true;
                        }
                    }
                }
            }
        }
        ServiceType::Other(other) => {
            return Err(Error::InvalidConfig(format!(
                "unsupported gateway service type: {other}"
            )));
        }
    }

    for (i, listener) in listeners.iter_mut().enumerate() {
        let certificate_secret_exists =
            input.certificate_secret_exists.get(i).copied().unwrap_or(false);
        let ctx = ListenerValidationContext {
            gateway_namespace: input.namespace,
            gateway_requests_addresses: input.requested_addresses,
            reference_grants: input.reference_grants,
            certificate_secret_exists,
        };
        validate_listener(listener, &ctx);
        // Pending -> Ready transition (spec.md §4.7 "Listener Ready aspect"):
        // a listener with no error of its own still reports Pending until the
        // gateway's own workload (pod + service) is ready.
        if !listener.status.ready.is_invalid() {
            listener.status.ready = if state.pod_ready && state.service_ready {
                crate::status::aspect::ListenerReady::Ready
            } else {
                crate::status::aspect::ListenerReady::Pending
            };
        }
    }

    state.listeners = listeners;
    state.reconcile_ready_rollup();
    Ok(state)
}

fn apply_pod_phase(state: &mut GatewayState, pod: &k8s_openapi::api::core::v1::Pod) {
    let phase = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("Unknown");

    let conditions = pod
        .status
        .as_ref()
        .and_then(|s| s.conditions.clone())
        .unwrap_or_default();

    match phase {
        "Pending" => {
            let unschedulable = conditions.iter().any(|c| {
                c.type_ == "PodScheduled"
                    && c.status == "False"
                    && c.reason.as_deref().unwrap_or("").contains("Unschedulable")
            });
            if unschedulable {
                let message = conditions
                    .iter()
                    .find(|c| c.type_ == "PodScheduled")
                    .map(|c| c.message.clone().unwrap_or_default())
                    .unwrap_or_default();
                state.status.scheduled = Scheduled::NoResources(message);
            } else {
                state.status.scheduled = Scheduled::NotReconciled;
            }
        }
        "Running" => {
            let ready = conditions
                .iter()
                .any(|c| c.type_ == "PodReady" && c.status == "True");
            if ready {
                state.pod_ready = true;
            }
        }
        "Succeeded" | "Failed" => state.status.scheduled = Scheduled::PodFailed,
        _ => state.status.scheduled = Scheduled::Unknown,
    }
}

/// Adds the implicit `kubernetes.io/metadata.name` label every namespace
/// carries, for policies that match on it without relying on it being synced
/// (spec.md §4.4 namespace-selector binding).
pub fn augmented_namespace_labels(
    mut labels: BTreeMap<String, String>,
    namespace_name: &str,
) -> BTreeMap<String, String> {
    labels.insert(
        "kubernetes.io/metadata.name".to_string(),
        namespace_name.to_string(),
    );
    labels
}
