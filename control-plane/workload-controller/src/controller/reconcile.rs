use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::diff::{ImagePlan, compute_image_patch};
use crate::crd::{ManagedWorkload, WorkloadKey};
use crate::store::{ObjectStore, StoreError, StoreResult};
use crate::templates::{build_deployment, build_service, image_for};

/// Terminal state of a successful attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Parent is gone and neither child remains.
    TornDown,
    /// The Service was created on this attempt.
    Created,
    /// Children exist and the image already matches.
    InSync,
    /// The Deployment image was patched.
    Patched { from: Option<String>, to: String },
}

/// Failures from the two independent teardown deletes.
#[derive(Debug, Default)]
pub struct TeardownFailure {
    pub deployment: Option<StoreError>,
    pub service: Option<StoreError>,
}

impl TeardownFailure {
    fn is_empty(&self) -> bool {
        self.deployment.is_none() && self.service.is_none()
    }
}

impl fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("deployment", &self.deployment),
            ("service", &self.service),
        ]
        .into_iter()
        .filter_map(|(kind, err)| {
            err.as_ref().map(|e| format!("delete {kind}: {e}"))
        })
        .collect();
        write!(f, "teardown failed: {}", parts.join("; "))
    }
}

impl std::error::Error for TeardownFailure {}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Teardown(TeardownFailure),

    #[error("reconcile cancelled")]
    Cancelled,
}

impl ReconcileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileError::Cancelled)
    }
}

/// Race a store call against cancellation. The outer error is only ever
/// `Cancelled`; the inner result is left for the caller to classify.
async fn guarded<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = StoreResult<T>>,
) -> Result<StoreResult<T>, ReconcileError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReconcileError::Cancelled),
        res = call => Ok(res),
    }
}

/// Drives the children of one ManagedWorkload toward its spec.
///
/// Holds no state between attempts: every decision is made from objects
/// fetched during the attempt, so any attempt can be re-run from the start.
pub struct Reconciler<S> {
    store: S,
}

impl<S: ObjectStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, cancel),
        fields(ns = %key.namespace, name = %key.name)
    )]
    pub async fn reconcile(
        &self,
        key: &WorkloadKey,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ReconcileError> {
        match guarded(cancel, self.store.get_workload(key)).await?? {
            None => {
                info!("reconcile: workload not found; deleting children");
                self.teardown(key, cancel).await
            }
            Some(workload) => self.ensure(key, &workload, cancel).await,
        }
    }

    async fn teardown(
        &self,
        key: &WorkloadKey,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ReconcileError> {
        let failure = TeardownFailure {
            deployment: absent_ok(
                guarded(cancel, self.store.delete_deployment(key)).await?,
                "deployment",
            ),
            service: absent_ok(
                guarded(cancel, self.store.delete_service(key)).await?,
                "service",
            ),
        };
        if failure.is_empty() {
            Ok(Outcome::TornDown)
        } else {
            Err(ReconcileError::Teardown(failure))
        }
    }

    async fn ensure(
        &self,
        key: &WorkloadKey,
        workload: &ManagedWorkload,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ReconcileError> {
        let tag = workload.spec.image_tag.as_str();
        info!(tag, "reconcile: ensuring children");

        let deployment = build_deployment(&key.name, &key.namespace, tag);
        let created =
            guarded(cancel, self.store.create_deployment(&deployment)).await?;
        match created {
            Ok(()) => info!("reconcile: deployment created"),
            // existing deployments are only drift-checked via the service path
            Err(e) if e.is_already_exists() => {
                info!("reconcile: deployment already exists")
            }
            Err(e) => {
                warn!(error = %e, "reconcile: failed to create deployment");
                return Err(e.into());
            }
        }

        let service = build_service(&key.name, &key.namespace);
        match guarded(cancel, self.store.create_service(&service)).await? {
            Ok(()) => {
                info!("reconcile: service created");
                return Ok(Outcome::Created);
            }
            // the port may be held by another workload; only the
            // deployment is checked from here
            Err(e) if e.is_node_port_allocated() => {
                warn!(error = %e, "reconcile: service node port is allocated")
            }
            Err(e) => {
                warn!(error = %e, "reconcile: failed to create service");
                return Err(e.into());
            }
        }

        self.reconcile_drift(key, tag, cancel).await
    }

    async fn reconcile_drift(
        &self,
        key: &WorkloadKey,
        tag: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome, ReconcileError> {
        let observed = guarded(cancel, self.store.get_deployment(key))
            .await??
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "deployment {key} disappeared before drift check"
                ))
            })?;

        let desired = image_for(tag);
        match compute_image_patch(&observed, &desired) {
            ImagePlan::NoOp => {
                debug!(image = %desired, "reconcile: image in sync");
                Ok(Outcome::InSync)
            }
            ImagePlan::Patch { from, to, patch } => {
                info!(
                    from = from.as_deref().unwrap_or("<none>"),
                    to = %to,
                    "reconcile: image tag changed; patching deployment"
                );
                guarded(cancel, self.store.patch_deployment(key, &patch))
                    .await?
                    .inspect_err(|e| {
                        warn!(error = %e, "reconcile: deployment patch failed")
                    })?;
                Ok(Outcome::Patched { from, to })
            }
        }
    }
}

/// A delete that finds nothing to delete has already succeeded.
fn absent_ok(res: StoreResult<()>, kind: &str) -> Option<StoreError> {
    match res {
        Ok(()) => {
            debug!(kind, "reconcile: child deleted");
            None
        }
        Err(e) if e.is_not_found() => {
            debug!(kind, "reconcile: child already absent");
            None
        }
        Err(e) => {
            warn!(kind, error = %e, "reconcile: failed to delete child");
            Some(e)
        }
    }
}
