//! The status updater (spec.md §4.6, C6): computes status deltas, preserves
//! timestamps when unchanged, and merges controller-owned parent statuses
//! with foreign ones.

use std::future::Future;

use ahash::AHashMap;

use crate::consts::STATUS_CONTROLLER_NAME;
use crate::error::Result;
use crate::model::gateway::{gateway_status_equal, GatewayState, GatewayStatus};
use crate::model::route::ParentStatus;
use crate::status::aspect::InSync;

/// `UpdateGatewayStatusOnSync` (spec.md §4.6). `deploy` and `sync` are the
/// deployer convergence call and the downstream publication call
/// respectively; both are suspension points (spec.md §5). Returns the
/// status to write back, or `None` if it is unchanged from `persisted`.
pub async fn update_gateway_status_on_sync<D, S>(
    state: &mut GatewayState,
    persisted: Option<&GatewayStatus>,
    deploy: D,
    sync: S,
) -> Result<Option<GatewayStatus>>
where
    D: Future<Output = Result<()>>,
    S: Future<Output = Result<bool>>,
{
    deploy.await?;

    match sync.await {
        Ok(did_sync) => {
            if did_sync {
                state.status.in_sync = InSync::InSync;
            }
        }
        Err(e) => {
            state.status.in_sync = InSync::SyncError(e.to_string());
        }
    }

    let fresh = state.status.clone();
    let unchanged = persisted
        .map(|p| gateway_status_equal(p, &fresh, state.generation))
        .unwrap_or(false);
    Ok(if unchanged { None } else { Some(fresh) })
}

/// Merges this controller's own parent statuses with foreign ones preserved
/// from the persisted status (spec.md §4.6, §9 "Status merging").
pub fn merge_route_parent_statuses(
    ours: &AHashMap<String, ParentStatus>,
    persisted: Option<&AHashMap<String, ParentStatus>>,
) -> AHashMap<String, ParentStatus> {
    let mut merged = AHashMap::new();
    if let Some(persisted) = persisted {
        for (key, status) in persisted {
            if status.controller_name != STATUS_CONTROLLER_NAME {
                merged.insert(key.clone(), status.clone());
            }
        }
    }
    for (key, status) in ours {
        merged.insert(key.clone(), status.clone());
    }
    merged
}

fn sorted_canonical_triples(
    map: &AHashMap<String, ParentStatus>,
    observed_generation: i64,
) -> Vec<String> {
    let mut triples: Vec<String> = map
        .iter()
        .map(|(parent_key, status)| {
            let conditions: Vec<_> = status
                .conditions(observed_generation)
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "type": c.type_,
                        "status": c.status,
                        "reason": c.reason,
                        "message": c.message,
                        "observedGeneration": c.observed_generation,
                    })
                })
                .collect();
            serde_json::json!({
                "parentRef": parent_key,
                "controllerName": status.controller_name,
                "conditions": conditions,
            })
            .to_string()
        })
        .collect();
    triples.sort();
    triples
}

/// Equality of two merged-parent-status maps, by the canonical
/// `(ParentRef, ControllerName, Conditions)` ordering (spec.md §4.6).
pub fn route_status_equal(
    a: &AHashMap<String, ParentStatus>,
    b: &AHashMap<String, ParentStatus>,
    observed_generation: i64,
) -> bool {
    sorted_canonical_triples(a, observed_generation) == sorted_canonical_triples(b, observed_generation)
}

/// `UpdateRouteStatus` (spec.md §4.6). Returns the merged map to write back,
/// or `None` if unchanged. The caller is responsible for restoring the
/// original in-memory parent statuses on write failure (spec.md §4.6 "on
/// failure, restore the original in-memory status").
pub fn update_route_status(
    ours: &AHashMap<String, ParentStatus>,
    persisted: Option<&AHashMap<String, ParentStatus>>,
    observed_generation: i64,
) -> Option<AHashMap<String, ParentStatus>> {
    let merged = merge_route_parent_statuses(ours, persisted);
    let unchanged = match persisted {
        Some(p) => route_status_equal(p, &merged, observed_generation),
        None => merged.is_empty(),
    };
    if unchanged {
        None
    } else {
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::listener::ListenerState;
    use crate::status::aspect::Accepted;

    fn gateway_state() -> GatewayState {
        GatewayState::new(1, Vec::<ListenerState>::new())
    }

    #[tokio::test]
    async fn unchanged_status_rewrites_nothing() {
        let mut state = gateway_state();
        let persisted = state.status.clone();
        let result = update_gateway_status_on_sync(
            &mut state,
            Some(&persisted),
            async { Ok(()) },
            async { Ok(true) },
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn sync_error_sets_insync_error_and_triggers_rewrite() {
        let mut state = gateway_state();
        let persisted = state.status.clone();
        let result = update_gateway_status_on_sync(
            &mut state,
            Some(&persisted),
            async { Ok(()) },
            async { Err(crate::error::Error::Store("boom".to_string())) },
        )
        .await
        .unwrap();
        assert!(result.is_some());
        assert!(matches!(state.status.in_sync, InSync::SyncError(_)));
    }

    #[tokio::test]
    async fn deploy_error_propagates() {
        let mut state = gateway_state();
        let result = update_gateway_status_on_sync(
            &mut state,
            None,
            async { Err(crate::error::Error::Deploy("nope".to_string())) },
            async { Ok(true) },
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn foreign_parent_status_is_preserved_across_merge() {
        let mut ours = AHashMap::new();
        ours.insert(
            "us".to_string(),
            ParentStatus {
                accepted: Accepted::Accepted,
                resolved_refs: Default::default(),
                controller_name: STATUS_CONTROLLER_NAME.to_string(),
            },
        );
        let mut persisted = AHashMap::new();
        persisted.insert(
            "them".to_string(),
            ParentStatus {
                accepted: Accepted::Accepted,
                resolved_refs: Default::default(),
                controller_name: "some.other/controller".to_string(),
            },
        );
        let merged = merge_route_parent_statuses(&ours, Some(&persisted));
        assert_eq!(merged.len(), 2);
        assert!(merged.contains_key("them"));
        assert!(merged.contains_key("us"));
    }

    #[test]
    fn merge_overwrites_our_own_previous_entry() {
        let mut ours = AHashMap::new();
        ours.insert(
            "us".to_string(),
            ParentStatus {
                accepted: Accepted::RouteKind,
                resolved_refs: Default::default(),
                controller_name: STATUS_CONTROLLER_NAME.to_string(),
            },
        );
        let mut persisted = AHashMap::new();
        persisted.insert(
            "us".to_string(),
            ParentStatus {
                accepted: Accepted::Accepted,
                resolved_refs: Default::default(),
                controller_name: STATUS_CONTROLLER_NAME.to_string(),
            },
        );
        let merged = merge_route_parent_statuses(&ours, Some(&persisted));
        assert!(matches!(merged["us"].accepted, Accepted::RouteKind));
    }
}
