//! Per-aspect condition aggregation (spec.md §4.2, C2).
//!
//! Each resource owns several independently-settable aspect records. Each
//! aspect maps to one condition `Type` string and produces exactly one
//! `Condition` at emission time: the first non-empty error slot (in declared
//! order) supplies Reason/Message and flips Status; otherwise the aspect
//! emits its "Base" (healthy) condition.

pub mod aspect;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";
pub const STATUS_UNKNOWN: &str = "Unknown";

/// Two conditions are equal iff Type, Status, Reason, Message and
/// ObservedGeneration match; LastTransitionTime is ignored (spec.md §4.2).
pub fn conditions_equal(a: &Condition, b: &Condition) -> bool {
    a.type_ == b.type_
        && a.status == b.status
        && a.reason == b.reason
        && a.message == b.message
        && a.observed_generation == b.observed_generation
}

/// Two condition sequences are equal iff element-wise equal in the same order.
pub fn condition_lists_equal(a: &[Condition], b: &[Condition]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| conditions_equal(x, y))
}

/// Canonical JSON of `(type, status, reason, message, observedGeneration)`,
/// used as a stable sort key so condition/parent-status ordering in output
/// never depends on map iteration order (spec.md §4.2, §4.6).
pub fn canonical_sort_key(c: &Condition) -> String {
    serde_json::json!({
        "type": c.type_,
        "status": c.status,
        "reason": c.reason,
        "message": c.message,
        "observedGeneration": c.observed_generation,
    })
    .to_string()
}

/// Sorts a condition list by its canonical JSON key, in place.
pub fn sort_conditions(conditions: &mut [Condition]) {
    conditions.sort_by(|a, b| canonical_sort_key(a).cmp(&canonical_sort_key(b)));
}

/// Builds a `Condition`, stamping `observed_generation` and leaving
/// `last_transition_time` for the caller (the status updater preserves the
/// existing timestamp when the condition is otherwise unchanged, spec.md §4.6).
pub fn make_condition(
    type_: &str,
    status: &str,
    reason: &str,
    message: impl Into<String>,
    observed_generation: i64,
) -> Condition {
    Condition {
        type_: type_.to_string(),
        status: status.to_string(),
        reason: reason.to_string(),
        message: message.into(),
        observed_generation: Some(observed_generation),
        last_transition_time: k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
            chrono::Utc::now(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(reason: &str) -> Condition {
        make_condition("Ready", STATUS_TRUE, reason, "ok", 3)
    }

    #[test]
    fn equality_ignores_last_transition_time() {
        let mut a = cond("AsExpected");
        let b = cond("AsExpected");
        a.last_transition_time.0 += chrono::Duration::seconds(30);
        assert!(conditions_equal(&a, &b));
    }

    #[test]
    fn equality_is_reflexive_symmetric_transitive() {
        let a = cond("AsExpected");
        let b = cond("AsExpected");
        let c = cond("AsExpected");
        assert!(conditions_equal(&a, &a));
        assert!(conditions_equal(&a, &b) == conditions_equal(&b, &a));
        assert!(conditions_equal(&a, &b) && conditions_equal(&b, &c) && conditions_equal(&a, &c));
    }

    #[test]
    fn differing_reason_breaks_equality() {
        let a = cond("AsExpected");
        let b = cond("SomethingElse");
        assert!(!conditions_equal(&a, &b));
    }

    #[test]
    fn sort_is_stable_regardless_of_input_order() {
        let mut first = vec![cond("B"), cond("A")];
        let mut second = vec![cond("A"), cond("B")];
        sort_conditions(&mut first);
        sort_conditions(&mut second);
        assert_eq!(
            first.iter().map(canonical_sort_key).collect::<Vec<_>>(),
            second.iter().map(canonical_sort_key).collect::<Vec<_>>()
        );
    }
}
