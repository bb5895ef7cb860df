//! The deployer (spec.md §4.5, C5): idempotent convergence of
//! service-account, TLS secret, deployment, and service for a managed
//! gateway. Every mutation is "get-or-build, merge, upsert" — repeated calls
//! with the same inputs produce no-op updates.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Secret, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;

use crate::cluster_api::ClusterApiClient;
use crate::consts::CA_BUNDLE_SECRET_KEY;
use crate::error::Result;
use crate::model::class_config::GatewayClassConfig;

fn gateway_labels(gateway_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app.kubernetes.io/managed-by".to_string(), "mesh-gateway-controller".to_string());
    labels.insert("gateway.networking.k8s.io/gateway-name".to_string(), gateway_name.to_string());
    labels
}

/// Deploys (or converges) all workload artifacts for one gateway (spec.md §4.5).
pub async fn deploy(
    gateway_namespace: &str,
    gateway_name: &str,
    downstream_namespace: &str,
    config: &GatewayClassConfig,
    ca_bundle: Option<&str>,
    cluster: &dyn ClusterApiClient,
) -> Result<()> {
    if config.mirror_namespace {
        cluster.ensure_namespace(downstream_namespace).await?;
    }

    if let Some(service_account_name) = &config.service_account_name {
        cluster
            .ensure_service_account(gateway_namespace, service_account_name)
            .await?;
    }

    if config.requires_ca_bundle() {
        let bundle = ca_bundle.unwrap_or_default();
        let secret = build_ca_bundle_secret(gateway_namespace, gateway_name, bundle);
        cluster.upsert_secret(gateway_namespace, secret).await?;
    }

    let existing_replicas = cluster
        .get_deployment(gateway_namespace, gateway_name)
        .await?
        .and_then(|d| d.spec.and_then(|s| s.replicas))
        .unwrap_or(config.replicas);

    let deployment = build_deployment(
        gateway_namespace,
        gateway_name,
        downstream_namespace,
        config,
        existing_replicas,
    );
    cluster.upsert_deployment(gateway_namespace, deployment).await?;

    let service = build_service(gateway_namespace, gateway_name, config);
    cluster.upsert_service(gateway_namespace, service).await?;

    Ok(())
}

fn build_ca_bundle_secret(namespace: &str, gateway_name: &str, ca_bundle: &str) -> Secret {
    let mut string_data = BTreeMap::new();
    string_data.insert(CA_BUNDLE_SECRET_KEY.to_string(), ca_bundle.to_string());
    Secret {
        metadata: ObjectMeta {
            name: Some(format!("{gateway_name}-ca-bundle")),
            namespace: Some(namespace.to_string()),
            labels: Some(gateway_labels(gateway_name)),
            ..Default::default()
        },
        string_data: Some(string_data),
        ..Default::default()
    }
}

fn build_deployment(
    namespace: &str,
    gateway_name: &str,
    downstream_namespace: &str,
    config: &GatewayClassConfig,
    replicas: i32,
) -> Deployment {
    let labels = gateway_labels(gateway_name);
    let mut env = vec![
        k8s_openapi::api::core::v1::EnvVar {
            name: "SDS_HOST".to_string(),
            value: Some(config.sds_host.clone()),
            ..Default::default()
        },
        k8s_openapi::api::core::v1::EnvVar {
            name: "SDS_PORT".to_string(),
            value: Some(config.sds_port.to_string()),
            ..Default::default()
        },
        k8s_openapi::api::core::v1::EnvVar {
            name: "DOWNSTREAM_NAMESPACE".to_string(),
            value: Some(downstream_namespace.to_string()),
            ..Default::default()
        },
    ];
    if config.requires_ca_bundle() {
        env.push(k8s_openapi::api::core::v1::EnvVar {
            name: "CA_BUNDLE_SECRET".to_string(),
            value: Some(format!("{gateway_name}-ca-bundle")),
            ..Default::default()
        });
    }

    Deployment {
        metadata: ObjectMeta {
            name: Some(gateway_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: config.service_account_name.clone(),
                    containers: vec![Container {
                        name: "gateway".to_string(),
                        image: Some(config.image.clone()),
                        env: Some(env),
                        ports: Some(vec![ContainerPort {
                            container_port: 8080,
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn build_service(namespace: &str, gateway_name: &str, config: &GatewayClassConfig) -> Service {
    let labels = gateway_labels(gateway_name);
    Service {
        metadata: ObjectMeta {
            name: Some(gateway_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(labels),
            ports: Some(vec![ServicePort {
                name: Some("gateway".to_string()),
                port: 80,
                target_port: Some(IntOrString::Int(8080)),
                ..Default::default()
            }]),
            type_: Some(if config.scheme == "https" {
                "LoadBalancer".to_string()
            } else {
                "ClusterIP".to_string()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayClassConfig {
        GatewayClassConfig {
            class_name: "default".to_string(),
            scheme: "https".to_string(),
            service_account_name: Some("mesh-gateway".to_string()),
            image: "mesh-gateway:latest".to_string(),
            replicas: 2,
            sds_host: "consul-server-grpc".to_string(),
            sds_port: 8502,
            mirror_namespace: false,
        }
    }

    #[test]
    fn deployment_preserves_requested_replicas() {
        let deployment = build_deployment("default", "gw", "mesh-default-gw", &config(), 5);
        assert_eq!(deployment.spec.unwrap().replicas, Some(5));
    }

    #[test]
    fn https_scheme_produces_loadbalancer_service() {
        let service = build_service("default", "gw", &config());
        assert_eq!(service.spec.unwrap().type_.as_deref(), Some("LoadBalancer"));
    }

    #[test]
    fn ca_bundle_secret_uses_fixed_key() {
        let secret = build_ca_bundle_secret("default", "gw", "----BEGIN CERT----");
        let data = secret.string_data.unwrap();
        assert!(data.contains_key(CA_BUNDLE_SECRET_KEY));
    }
}
