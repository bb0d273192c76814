use std::fmt;

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind marker carried in the ownership label set of every child object.
pub const KIND: &str = "ManagedWorkload";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "oaas.io",
    version = "v1alpha1",
    kind = "ManagedWorkload",
    plural = "managedworkloads",
    shortname = "mwl",
    namespaced,
    printcolumn = r#"{"name":"Tag","type":"string","jsonPath":".spec.imageTag"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedWorkloadSpec {
    /// Tag appended to the fixed image repository of the workload container
    pub image_tag: String,
}

/// Identity of a ManagedWorkload. Both child objects share it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkloadKey {
    pub namespace: String,
    pub name: String,
}

impl WorkloadKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl ManagedWorkload {
    pub fn key(&self) -> WorkloadKey {
        WorkloadKey::new(
            self.namespace().unwrap_or_else(|| "default".to_string()),
            self.name_any(),
        )
    }
}
