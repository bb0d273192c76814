use k8s_openapi::api::apps::v1::Deployment;
use serde_json::json;

use crate::store::FieldPatch;
use crate::templates::container_image;
use crate::templates::workload::CONTAINER_NAME;

/// Result of comparing the observed image against the desired one.
#[derive(Clone, Debug, PartialEq)]
pub enum ImagePlan {
    NoOp,
    Patch {
        from: Option<String>,
        to: String,
        patch: FieldPatch,
    },
}

/// Patch touching only the workload container's image. Containers merge by
/// name, so other containers and sibling fields keep their values.
pub fn image_patch(desired_image: &str) -> FieldPatch {
    FieldPatch::new(json!({
        "spec": {
            "template": {
                "spec": {
                    "containers": [
                        { "name": CONTAINER_NAME, "image": desired_image }
                    ]
                }
            }
        }
    }))
}

pub fn compute_image_patch(
    observed: &Deployment,
    desired_image: &str,
) -> ImagePlan {
    let current = container_image(observed);
    if current == Some(desired_image) {
        return ImagePlan::NoOp;
    }
    ImagePlan::Patch {
        from: current.map(str::to_string),
        to: desired_image.to_string(),
        patch: image_patch(desired_image),
    }
}
