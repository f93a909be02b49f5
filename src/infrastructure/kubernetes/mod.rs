pub mod client;

pub use client::{build_client, default_kubeconfig_path, resolve_kubeconfig_path};
