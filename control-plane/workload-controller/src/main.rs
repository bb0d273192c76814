use envconfig::Envconfig;
use kube::Client;
use tracing::info;
use workload_controller::{
    config::ControllerConfig, controller::run_controller, init_tracing,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    // Ensure rustls uses the aws-lc-rs provider explicitly.
    if let Err(e) = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::aws_lc_rs::default_provider(),
    ) {
        tracing::debug!(
            ?e,
            "CryptoProvider already installed or incompatible; proceeding"
        );
    }

    let cfg = ControllerConfig::init_from_env()?;
    info!(?cfg, "Starting workload controller");

    let client = Client::try_default().await?;
    run_controller(client, cfg).await
}
