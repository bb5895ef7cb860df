//! `RouteValidator` (spec.md §4.3).

use crate::backend_resolver::BackendResolver;
use crate::consts::GATEWAY_API_GROUP;
use crate::error::{Result, ResolutionError};
use crate::matching::reference_grant_authorized;
use crate::model::reference_grant::ReferenceGrant;
use crate::model::route::{Route, RouteState};

pub struct RouteValidationContext<'a> {
    pub namespace: &'a str,
    pub reference_grants: &'a [ReferenceGrant],
}

/// Validates a route's backend references, accumulating resolution errors
/// rather than failing (spec.md §4.3, §7). Fails fast only on infrastructure
/// errors from the resolver.
pub async fn validate_route(
    route: &Route,
    ctx: &RouteValidationContext<'_>,
    resolver: &dyn BackendResolver,
) -> Result<RouteState> {
    let mut state = RouteState::default();

    match route {
        Route::Http { rules, .. } => {
            for (rule_idx, rule) in rules.iter().enumerate() {
                let key = format!("rule-{rule_idx}");
                for backend in &rule.backend_refs {
                    let to_group = backend.group.as_deref().unwrap_or("");
                    let to_kind = backend.kind.as_deref().unwrap_or("Service");
                    let authorized = reference_grant_authorized(
                        ctx.reference_grants,
                        GATEWAY_API_GROUP,
                        "HTTPRoute",
                        ctx.namespace,
                        to_group,
                        to_kind,
                        backend.namespace.as_deref(),
                        &backend.name,
                    );
                    if !authorized {
                        state.push_error(ResolutionError::RefNotPermitted {
                            message: format!(
                                "cross-namespace backend reference to {to_kind} {} not permitted",
                                backend.name
                            ),
                        });
                        continue;
                    }
                    match resolver.resolve(ctx.namespace, backend).await? {
                        Ok(()) => {
                            state
                                .resolved_refs
                                .entry(key.clone())
                                .or_default()
                                .push(backend.clone());
                        }
                        Err(resolution_error) => state.push_error(resolution_error),
                    }
                }
            }
        }
        Route::Tcp { rules, .. } => {
            if rules.len() != 1 || rules[0].backend_refs.len() != 1 {
                state.push_error(ResolutionError::Other {
                    message: "a TCPRoute must declare exactly one rule with exactly one backendRef"
                        .to_string(),
                });
                return Ok(state);
            }
            let backend = &rules[0].backend_refs[0];
            let to_group = backend.group.as_deref().unwrap_or("");
            let to_kind = backend.kind.as_deref().unwrap_or("Service");
            let authorized = reference_grant_authorized(
                ctx.reference_grants,
                GATEWAY_API_GROUP,
                "TCPRoute",
                ctx.namespace,
                to_group,
                to_kind,
                backend.namespace.as_deref(),
                &backend.name,
            );
            if !authorized {
                state.push_error(ResolutionError::RefNotPermitted {
                    message: format!(
                        "cross-namespace backend reference to {to_kind} {} not permitted",
                        backend.name
                    ),
                });
                return Ok(state);
            }
            match resolver.resolve(ctx.namespace, backend).await? {
                Ok(()) => {
                    state
                        .resolved_refs
                        .entry("rule-0".to_string())
                        .or_default()
                        .push(backend.clone());
                }
                Err(resolution_error) => state.push_error(resolution_error),
            }
        }
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::route::{BackendRef, RouteRule};
    use async_trait::async_trait;

    struct AlwaysOk;
    #[async_trait]
    impl BackendResolver for AlwaysOk {
        async fn resolve(
            &self,
            _namespace: &str,
            _backend: &BackendRef,
        ) -> Result<std::result::Result<(), ResolutionError>> {
            Ok(Ok(()))
        }
    }

    struct AlwaysServiceNotFound;
    #[async_trait]
    impl BackendResolver for AlwaysServiceNotFound {
        async fn resolve(
            &self,
            _namespace: &str,
            backend: &BackendRef,
        ) -> Result<std::result::Result<(), ResolutionError>> {
            Ok(Err(ResolutionError::ServiceNotFound {
                message: format!("{} not found", backend.name),
            }))
        }
    }

    fn backend(name: &str) -> BackendRef {
        BackendRef {
            group: None,
            kind: None,
            name: name.to_string(),
            namespace: None,
            port: Some(8080),
        }
    }

    #[tokio::test]
    async fn tcp_route_requires_exactly_one_rule_and_backend() {
        let route = Route::Tcp {
            parent_refs: vec![],
            rules: vec![
                RouteRule {
                    backend_refs: vec![backend("a")],
                },
                RouteRule {
                    backend_refs: vec![backend("b")],
                },
            ],
        };
        let ctx = RouteValidationContext {
            namespace: "default",
            reference_grants: &[],
        };
        let state = validate_route(&route, &ctx, &AlwaysOk).await.unwrap();
        assert!(!state.valid());
    }

    #[tokio::test]
    async fn tcp_route_resolution_failure_still_returns_ok() {
        let route = Route::Tcp {
            parent_refs: vec![],
            rules: vec![RouteRule {
                backend_refs: vec![backend("missing")],
            }],
        };
        let ctx = RouteValidationContext {
            namespace: "default",
            reference_grants: &[],
        };
        let state = validate_route(&route, &ctx, &AlwaysServiceNotFound)
            .await
            .unwrap();
        assert!(!state.valid());
        assert!(matches!(
            state.flatten_resolved_refs(),
            crate::status::aspect::RouteResolvedRefs::ServiceNotFound(_)
        ));
    }

    #[tokio::test]
    async fn http_route_continues_past_denied_backend() {
        let route = Route::Http {
            parent_refs: vec![],
            rules: vec![RouteRule {
                backend_refs: vec![backend("a"), backend("b")],
            }],
            http: Default::default(),
        };
        let ctx = RouteValidationContext {
            namespace: "default",
            reference_grants: &[],
        };
        let state = validate_route(&route, &ctx, &AlwaysOk).await.unwrap();
        assert!(state.valid());
        assert_eq!(state.resolved_refs.len(), 1);
    }
}
