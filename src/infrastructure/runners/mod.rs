pub mod kubernetes_runner;

pub use kubernetes_runner::{JobApi, JobRunReport, KubeJobApi, KubernetesJobRunner};
