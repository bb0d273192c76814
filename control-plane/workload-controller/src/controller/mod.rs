pub mod diff;
pub mod reconcile;

use std::sync::Arc;

use futures_util::StreamExt;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service};
use kube::{
    Client, Resource, ResourceExt,
    api::Api,
    runtime::{
        Controller,
        controller::{self, Action},
        reflector::ObjectRef,
        watcher::Config,
    },
};
use tokio::sync::oneshot;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ControllerConfig;
use crate::crd::{ManagedWorkload, WorkloadKey};
use crate::store::KubeStore;
use crate::templates::{managed_selector, owner_of};

pub use reconcile::{Outcome, ReconcileError, Reconciler, TeardownFailure};


pub struct ControllerContext {
    pub reconciler: Reconciler<KubeStore>,
    pub cfg: ControllerConfig,
    /// Cancelled on shutdown; in-flight attempts end as `Cancelled`.
    pub shutdown: CancellationToken,
}

fn api_for<K>(client: &Client, ns: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match ns {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Map a workload event to the workload itself. Unlike the primary watch,
/// this one also yields deletions, which end up as `ObjectNotFound`.
fn self_ref(workload: ManagedWorkload) -> Option<ObjectRef<ManagedWorkload>> {
    Some(ObjectRef::from_obj(&workload))
}

/// Map a labelled child object back to the workload that owns it.
fn parent_of<K: ResourceExt>(child: K) -> Option<ObjectRef<ManagedWorkload>> {
    let name = owner_of(child.labels())?;
    let ns = child.namespace()?;
    Some(ObjectRef::new(name).within(&ns))
}

pub async fn run_controller(
    client: Client,
    cfg: ControllerConfig,
) -> anyhow::Result<()> {
    let ns = cfg.watch_namespace.clone();
    let workloads: Api<ManagedWorkload> = api_for(&client, ns.as_deref());
    let deletions: Api<ManagedWorkload> = api_for(&client, ns.as_deref());
    let deployments: Api<Deployment> = api_for(&client, ns.as_deref());
    let services: Api<Service> = api_for(&client, ns.as_deref());

    let shutdown = CancellationToken::new();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown requested; cancelling in-flight reconciles");
        token.cancel();
        let _ = stop_tx.send(());
    });

    let store = KubeStore::new(client, cfg.field_manager.clone());
    let ctx = Arc::new(ControllerContext {
        reconciler: Reconciler::new(store),
        cfg,
        shutdown,
    });
    info!(namespace = ?ns, "starting ManagedWorkload controller");

    let children = Config::default().labels(&managed_selector());
    Controller::new(workloads, Config::default())
        .watches(deletions, Config::default(), self_ref)
        .watches(deployments, children.clone(), parent_of::<Deployment>)
        .watches(services, children, parent_of::<Service>)
        .graceful_shutdown_on(async move {
            let _ = stop_rx.await;
        })
        .run(reconcile, error_policy, ctx.clone())
        .for_each(|res| {
            let ctx = ctx.clone();
            async move {
                match res {
                    Ok((obj_ref, action)) => info!(
                        workload = %obj_ref,
                        "reconciled: requeue={:?}",
                        action
                    ),
                    // triggers for deleted workloads never reach `reconcile`
                    Err(controller::Error::ObjectNotFound(obj_ref)) => {
                        let key = WorkloadKey::new(
                            obj_ref
                                .namespace
                                .clone()
                                .unwrap_or_else(|| "default".to_string()),
                            obj_ref.name.clone(),
                        );
                        teardown_orphan(&ctx, &key).await;
                    }
                    Err(e) => error!(error = ?e, "reconcile error"),
                }
            }
        })
        .await;

    Ok(())
}

async fn teardown_orphan(ctx: &ControllerContext, key: &WorkloadKey) {
    match ctx.reconciler.reconcile(key, &ctx.shutdown).await {
        Ok(outcome) => {
            info!(workload = %key, ?outcome, "reconciled orphaned children")
        }
        Err(e) => {
            warn!(workload = %key, error = %e, "orphan teardown failed")
        }
    }
}

async fn reconcile(
    obj: Arc<ManagedWorkload>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileError> {
    let outcome = ctx.reconciler.reconcile(&obj.key(), &ctx.shutdown).await?;
    info!(workload = %obj.key(), ?outcome, "reconcile: done");
    Ok(Action::requeue(Duration::from_secs(ctx.cfg.resync_secs)))
}

fn error_policy(
    obj: Arc<ManagedWorkload>,
    err: &ReconcileError,
    ctx: Arc<ControllerContext>,
) -> Action {
    if err.is_cancelled() {
        return Action::await_change();
    }
    warn!(workload = %obj.key(), error = %err, "reconcile failed; requeueing");
    Action::requeue(Duration::from_secs(ctx.cfg.requeue_secs))
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
