use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::trace;

use super::{FieldPatch, ObjectStore, StoreResult};
use crate::crd::{ManagedWorkload, WorkloadKey};

/// [`ObjectStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }

    fn patch_params(&self) -> PatchParams {
        PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }
}

fn namespace_of<K: ResourceExt>(obj: &K) -> String {
    obj.namespace().unwrap_or_else(|| "default".to_string())
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_workload(
        &self,
        key: &WorkloadKey,
    ) -> StoreResult<Option<ManagedWorkload>> {
        let api: Api<ManagedWorkload> =
            Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    async fn get_deployment(
        &self,
        key: &WorkloadKey,
    ) -> StoreResult<Option<Deployment>> {
        let api: Api<Deployment> =
            Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    async fn get_service(
        &self,
        key: &WorkloadKey,
    ) -> StoreResult<Option<Service>> {
        let api: Api<Service> =
            Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    async fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> StoreResult<()> {
        let api: Api<Deployment> =
            Api::namespaced(self.client.clone(), &namespace_of(deployment));
        api.create(&self.post_params(), deployment).await?;
        trace!(name = %deployment.name_any(), "store: deployment created");
        Ok(())
    }

    async fn create_service(&self, service: &Service) -> StoreResult<()> {
        let api: Api<Service> =
            Api::namespaced(self.client.clone(), &namespace_of(service));
        api.create(&self.post_params(), service).await?;
        trace!(name = %service.name_any(), "store: service created");
        Ok(())
    }

    async fn patch_deployment(
        &self,
        key: &WorkloadKey,
        patch: &FieldPatch,
    ) -> StoreResult<()> {
        let api: Api<Deployment> =
            Api::namespaced(self.client.clone(), &key.namespace);
        api.patch(
            &key.name,
            &self.patch_params(),
            &Patch::Strategic(patch.document()),
        )
        .await?;
        Ok(())
    }

    async fn delete_deployment(&self, key: &WorkloadKey) -> StoreResult<()> {
        let api: Api<Deployment> =
            Api::namespaced(self.client.clone(), &key.namespace);
        api.delete(&key.name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn delete_service(&self, key: &WorkloadKey) -> StoreResult<()> {
        let api: Api<Service> =
            Api::namespaced(self.client.clone(), &key.namespace);
        api.delete(&key.name, &DeleteParams::default()).await?;
        Ok(())
    }
}
