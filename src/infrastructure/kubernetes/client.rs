//! Kubernetes client construction
//!
//! Resolves which kubeconfig to use and builds a `kube::Client` from its
//! current context.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Home directory from `HOME`, or `USERPROFILE` on Windows
fn home_dir_from(home: Option<OsString>, user_profile: Option<OsString>) -> Option<PathBuf> {
    home.filter(|h| !h.is_empty())
        .or_else(|| user_profile.filter(|h| !h.is_empty()))
        .map(PathBuf::from)
}

/// `<home>/.kube/config`, if a home directory is known
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    home_dir_from(std::env::var_os("HOME"), std::env::var_os("USERPROFILE"))
        .map(|home| home.join(".kube").join("config"))
}

/// An explicit, non-empty path wins over the default location
pub fn resolve_kubeconfig_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.filter(|p| !p.as_os_str().is_empty())
        .or_else(default_kubeconfig_path)
}

/// Build a client from the kubeconfig at `path`, using its current context.
///
/// Without a path the configuration is inferred (in-cluster service account
/// or `KUBECONFIG`).
pub async fn build_client(path: Option<&Path>) -> Result<Client> {
    let config = match path {
        Some(path) => {
            debug!("Reading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                AppError::KubeConfig(format!(
                    "Failed to read kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    AppError::KubeConfig(format!(
                        "Failed to load kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?
        }
        None => Config::infer().await.map_err(|e| {
            AppError::KubeConfig(format!("Failed to infer Kubernetes config: {}", e))
        })?,
    };

    info!("☸️  Using Kubernetes API server {}", config.cluster_url);

    Client::try_from(config).map_err(|e| {
        AppError::KubeConfig(format!("Failed to create Kubernetes client: {}", e))
    })
}
