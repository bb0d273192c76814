use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort,
    ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, ObjectMeta,
};

use super::labels::labels_for;

pub const IMAGE_REPOSITORY: &str = "abangser/todo-local-storage";
pub const CONTAINER_NAME: &str = "nginx";
pub const REPLICAS: i32 = 2;
pub const CONTAINER_PORT: i32 = 80;
pub const SERVICE_PORT: i32 = 80;
pub const NODE_PORT: i32 = 31000;
pub const SERVICE_TYPE: &str = "NodePort";

/// Full image reference for `image_tag`. The tag is not validated here.
pub fn image_for(image_tag: &str) -> String {
    format!("{}:{}", IMAGE_REPOSITORY, image_tag)
}

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels_for(name)),
        ..Default::default()
    }
}

/// Desired Deployment for the workload `name`.
pub fn build_deployment(
    name: &str,
    namespace: &str,
    image_tag: &str,
) -> Deployment {
    let labels = Some(labels_for(name));
    Deployment {
        metadata: metadata(name, namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(REPLICAS),
            selector: LabelSelector {
                match_labels: labels.clone(),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels,
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: CONTAINER_NAME.to_string(),
                        image: Some(image_for(image_tag)),
                        ports: Some(vec![ContainerPort {
                            container_port: CONTAINER_PORT,
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

/// Desired NodePort Service for the workload `name`.
pub fn build_service(name: &str, namespace: &str) -> Service {
    Service {
        metadata: metadata(name, namespace),
        spec: Some(ServiceSpec {
            type_: Some(SERVICE_TYPE.to_string()),
            selector: Some(labels_for(name)),
            ports: Some(vec![ServicePort {
                port: SERVICE_PORT,
                node_port: Some(NODE_PORT),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Image of the workload container, falling back to the first container.
pub fn container_image(deployment: &Deployment) -> Option<&str> {
    let containers = &deployment
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers;
    containers
        .iter()
        .find(|c| c.name == CONTAINER_NAME)
        .or_else(|| containers.first())
        .and_then(|c| c.image.as_deref())
}
