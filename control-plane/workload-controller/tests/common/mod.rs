#![allow(dead_code)]

use std::time::Duration;

use envconfig::Envconfig;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service};
use kube::{
    Client,
    api::{Api, PostParams},
};
use tokio::task::JoinHandle;
use workload_controller::config::ControllerConfig;
use workload_controller::crd::{ManagedWorkload, ManagedWorkloadSpec};

// DNS-1123 safe numeric suffix for unique names
pub const DIGITS: [char; 10] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
pub fn uniq(prefix: &str) -> String {
    format!("{prefix}-{}", nanoid::nanoid!(6, &DIGITS))
}

pub async fn create_workload(
    client: Client,
    ns: &str,
    name: &str,
    tag: &str,
) -> ManagedWorkload {
    let api: Api<ManagedWorkload> = Api::namespaced(client, ns);
    let wl = ManagedWorkload::new(
        name,
        ManagedWorkloadSpec {
            image_tag: tag.to_string(),
        },
    );
    api.create(&PostParams::default(), &wl)
        .await
        .expect("create ManagedWorkload")
}

pub fn spawn_controller(client: Client) -> JoinHandle<()> {
    let cfg = ControllerConfig::init_from_hashmap(&Default::default())
        .expect("default config");
    tokio::spawn(async move {
        let _ = workload_controller::controller::run_controller(client, cfg)
            .await;
    })
}

/// Poll `check` once a second until it holds or `secs` elapse.
pub async fn eventually<F, Fut>(secs: u64, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..secs {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1000)).await;
    }
    false
}

pub async fn cleanup_k8s(ns: &str, name: &str, client: Client) {
    let wl_api: Api<ManagedWorkload> = Api::namespaced(client.clone(), ns);
    let dep_api: Api<Deployment> = Api::namespaced(client.clone(), ns);
    let svc_api: Api<Service> = Api::namespaced(client, ns);
    let _ = wl_api.delete(name, &Default::default()).await;
    let _ = dep_api.delete(name, &Default::default()).await;
    let _ = svc_api.delete(name, &Default::default()).await;
}

// RAII guard to ensure controller abort + cleanup
pub struct ControllerGuard {
    ns: String,
    name: String,
    client: Client,
    ctrl: Option<JoinHandle<()>>,
}

impl ControllerGuard {
    pub fn new(ns: &str, name: &str, client: Client) -> Self {
        Self {
            ns: ns.to_string(),
            name: name.to_string(),
            client,
            ctrl: None,
        }
    }
    pub fn with_controller(mut self, ctrl: JoinHandle<()>) -> Self {
        self.ctrl = Some(ctrl);
        self
    }
}

impl Drop for ControllerGuard {
    fn drop(&mut self) {
        if let Some(ref handle) = self.ctrl {
            handle.abort();
        }
        let ns = self.ns.clone();
        let name = self.name.clone();
        let client = self.client.clone();
        let _ = tokio::spawn(async move {
            cleanup_k8s(&ns, &name, client).await;
        });
    }
}
