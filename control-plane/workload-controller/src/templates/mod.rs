pub mod labels;
pub mod workload;

pub use labels::{labels_for, managed_selector, owner_of};
pub use workload::{build_deployment, build_service, container_image, image_for};
