mod error;
mod kube_store;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use serde_json::Value as JsonValue;

use crate::crd::{ManagedWorkload, WorkloadKey};

pub use self::error::{InvalidReason, StoreError, StoreResult};
pub use self::kube_store::KubeStore;

/// Field-scoped patch document applied with strategic-merge semantics:
/// list entries merge by their `name` key and fields absent from the
/// document are left untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldPatch(JsonValue);

impl FieldPatch {
    pub fn new(document: JsonValue) -> Self {
        Self(document)
    }

    pub fn document(&self) -> &JsonValue {
        &self.0
    }
}

/// Access to the platform's object store.
///
/// Reads collapse a missing object to `Ok(None)`; every other failure is
/// returned as a classified [`StoreError`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_workload(
        &self,
        key: &WorkloadKey,
    ) -> StoreResult<Option<ManagedWorkload>>;
    async fn get_deployment(
        &self,
        key: &WorkloadKey,
    ) -> StoreResult<Option<Deployment>>;
    async fn get_service(
        &self,
        key: &WorkloadKey,
    ) -> StoreResult<Option<Service>>;
    async fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> StoreResult<()>;
    async fn create_service(&self, service: &Service) -> StoreResult<()>;
    async fn patch_deployment(
        &self,
        key: &WorkloadKey,
        patch: &FieldPatch,
    ) -> StoreResult<()>;
    async fn delete_deployment(&self, key: &WorkloadKey) -> StoreResult<()>;
    async fn delete_service(&self, key: &WorkloadKey) -> StoreResult<()>;
}
