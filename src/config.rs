//! Connection configuration built from a kubeconfig file.

use std::path::Path;

use anyhow::{Context, Result};
use kube::{
    config::{KubeConfigOptions, Kubeconfig, KubeconfigError},
    Client, Config,
};
use tracing::instrument;

async fn read_config(path: &Path, context: Option<&str>) -> Result<Config, KubeconfigError> {
    let kubeconfig = Kubeconfig::read_from(path)?;
    let options = KubeConfigOptions {
        context: context.map(str::to_owned),
        ..Default::default()
    };
    Config::from_custom_kubeconfig(kubeconfig, &options).await
}

/// Build a client configuration from the kubeconfig at `path`.
///
/// `context` selects a kubeconfig context; `None` uses the file's current context.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn load(path: &Path, context: Option<&str>) -> Result<Config> {
    let config = read_config(path, context).await.with_context(|| {
        format!(
            "Failed to create the configuration from the {} kubeconfig file",
            path.display()
        )
    })?;
    tracing::debug!(
        cluster_url = %config.cluster_url,
        namespace = %config.default_namespace,
        "loaded kubeconfig"
    );
    Ok(config)
}

/// Connect a client for the kubeconfig at `path`.
pub async fn client(path: &Path, context: Option<&str>) -> Result<Client> {
    let config = load(path, context).await?;
    Client::try_from(config).context("Failed to create the kubernetes client")
}
