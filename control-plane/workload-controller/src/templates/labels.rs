use std::collections::BTreeMap;

use crate::crd::KIND;

/// Label carrying the owning workload's name.
pub const WORKLOAD_LABEL: &str = "oaas.io/workload";
/// Label marking objects managed on behalf of a ManagedWorkload.
pub const KIND_LABEL: &str = "oaas.io/kind";

/// Ownership label set for the workload `name`.
///
/// The same map is attached to child objects and used as their selector, so a
/// workload's children can be found by label alone.
pub fn labels_for(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (WORKLOAD_LABEL.to_string(), name.to_string()),
        (KIND_LABEL.to_string(), KIND.to_string()),
    ])
}

/// Selector matching every child object managed by this controller.
pub fn managed_selector() -> String {
    format!("{}={}", KIND_LABEL, KIND)
}

/// Name of the owning workload, if `labels` carries the ownership label set.
pub fn owner_of(labels: &BTreeMap<String, String>) -> Option<&str> {
    match labels.get(KIND_LABEL) {
        Some(kind) if kind == KIND => {
            labels.get(WORKLOAD_LABEL).map(String::as_str)
        }
        _ => None,
    }
}
