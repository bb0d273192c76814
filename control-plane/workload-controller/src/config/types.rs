use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct ControllerConfig {
    /// Restrict watches to a single namespace; cluster-wide when unset.
    /// Env: OPRC_WL_NAMESPACE
    #[envconfig(from = "OPRC_WL_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Delay before retrying a failed reconcile.
    /// Env: OPRC_WL_REQUEUE_SECS
    #[envconfig(from = "OPRC_WL_REQUEUE_SECS", default = "30")]
    pub requeue_secs: u64,

    /// Periodic resync after a successful reconcile.
    /// Env: OPRC_WL_RESYNC_SECS
    #[envconfig(from = "OPRC_WL_RESYNC_SECS", default = "300")]
    pub resync_secs: u64,

    #[envconfig(
        from = "OPRC_WL_FIELD_MANAGER",
        default = "workload-controller"
    )]
    pub field_manager: String,
}
