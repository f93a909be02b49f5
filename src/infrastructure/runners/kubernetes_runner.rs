//! Kubernetes job runner
//!
//! Submits a Job to the cluster and removes it again. Failures from the
//! create and delete calls are logged and recorded in the run report; they
//! never abort the run.

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job as K8sJob;
use kube::{
    api::{DeleteParams, PostParams},
    Api, Client,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::{CleanupSettings, PropagationPolicy};
use crate::error::{AppError, Result};

/// Job operations against the cluster API
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create the Job and return the object stored by the API server
    async fn create(&self, job: &K8sJob, params: &PostParams) -> Result<K8sJob>;

    /// Delete the Job with the given name
    async fn delete(&self, name: &str, params: &DeleteParams) -> Result<()>;
}

/// `JobApi` backed by `kube::Api<Job>` for a single namespace
pub struct KubeJobApi {
    jobs_api: Api<K8sJob>,
}

impl KubeJobApi {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            jobs_api: Api::namespaced(client, namespace),
        }
    }
}

#[async_trait]
impl JobApi for KubeJobApi {
    async fn create(&self, job: &K8sJob, params: &PostParams) -> Result<K8sJob> {
        self.jobs_api
            .create(params, job)
            .await
            .map_err(AppError::from)
    }

    async fn delete(&self, name: &str, params: &DeleteParams) -> Result<()> {
        self.jobs_api
            .delete(name, params)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }
}

/// Outcome of a create-then-delete run
#[derive(Debug, Clone, Default)]
pub struct JobRunReport {
    pub job_name: String,
    /// Object returned by the create call
    pub created: Option<K8sJob>,
    pub create_error: Option<String>,
    pub deleted: bool,
    pub delete_error: Option<String>,
}

impl JobRunReport {
    pub fn is_clean(&self) -> bool {
        self.create_error.is_none() && self.delete_error.is_none()
    }
}

/// Kubernetes job runner
pub struct KubernetesJobRunner {
    api: Arc<dyn JobApi>,
    cleanup: CleanupSettings,
    dry_run: bool,
}

impl KubernetesJobRunner {
    pub fn new(api: Arc<dyn JobApi>, cleanup: CleanupSettings, dry_run: bool) -> Self {
        Self {
            api,
            cleanup,
            dry_run,
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            dry_run: self.dry_run,
            ..Default::default()
        }
    }

    fn delete_params(&self) -> DeleteParams {
        let params = match self.cleanup.propagation_policy {
            Some(PropagationPolicy::Background) => DeleteParams::background(),
            Some(PropagationPolicy::Foreground) => DeleteParams::foreground(),
            Some(PropagationPolicy::Orphan) => DeleteParams::orphan(),
            None => DeleteParams::default(),
        };
        DeleteParams {
            dry_run: self.dry_run,
            ..params
        }
    }

    /// Submit the Job to the cluster
    pub async fn create_job(&self, job: &K8sJob) -> Result<K8sJob> {
        let created = self.api.create(job, &self.post_params()).await?;
        info!(
            "🚀 Created Kubernetes job: {} (dry run: {})",
            created.metadata.name.as_deref().unwrap_or_default(),
            self.dry_run
        );
        Ok(created)
    }

    /// Remove the Job from the cluster
    pub async fn delete_job(&self, name: &str) -> Result<()> {
        self.api.delete(name, &self.delete_params()).await?;
        info!("🗑️  Deleted Kubernetes job: {} (dry run: {})", name, self.dry_run);
        Ok(())
    }

    /// Create the Job, then delete it.
    ///
    /// Delete is attempted even when create failed. Errors are logged and
    /// recorded in the report. A dry-run create stores nothing, so a 404 on
    /// the dry-run delete is expected.
    pub async fn run(&self, job: &K8sJob) -> JobRunReport {
        let job_name = job.metadata.name.clone().unwrap_or_default();
        let mut report = JobRunReport {
            job_name: job_name.clone(),
            ..Default::default()
        };

        match self.create_job(job).await {
            Ok(created) => report.created = Some(created),
            Err(e) => {
                error!("Failed to create Kubernetes job {}: {}", job_name, e);
                report.create_error = Some(e.to_string());
            }
        }

        if !self.cleanup.remove_job {
            debug!("Job removal disabled, keeping Kubernetes job: {}", job_name);
            return report;
        }

        match self.delete_job(&job_name).await {
            Ok(()) => report.deleted = true,
            Err(e) if self.dry_run && e.is_not_found() => {
                debug!(
                    "Dry-run job {} was never persisted, nothing to delete",
                    job_name
                );
            }
            Err(e) => {
                error!("Failed to delete Kubernetes job {}: {}", job_name, e);
                report.delete_error = Some(e.to_string());
            }
        }

        report
    }
}
