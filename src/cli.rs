//! Command-line interface.

use clap::Parser;
use k8s_openapi::api::batch::v1::Job as K8sJob;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{
    load_dotenv, load_dotenv_from, AppConfiguration, ConfigManager, OutputFormat,
};
use crate::domain::entities::RunContext;
use crate::error::Result;
use crate::infrastructure::kubernetes::{build_client, resolve_kubeconfig_path};
use crate::infrastructure::runners::{JobRunReport, KubeJobApi, KubernetesJobRunner};

/// Submit a Kubernetes Job and delete it again
#[derive(Debug, Parser)]
#[command(name = "kube-job-runner", version, about, long_about = None)]
pub struct Cli {
    /// Absolute path to the kubeconfig file (defaults to ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Namespace to submit the Job to
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Path to a YAML or JSON configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Env file to load instead of searching for `.env`
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Send create and delete as server-side dry runs
    #[arg(long)]
    pub dry_run: bool,

    /// Keep the Job instead of deleting it after creation
    #[arg(long)]
    pub keep: bool,

    /// Print format for the created Job
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

impl Cli {
    /// Load `--env-file`, or a `.env` found from the working directory
    pub fn load_env_file(&self) -> Result<Option<PathBuf>> {
        match &self.env_file {
            Some(path) => load_dotenv_from(path).map(Some),
            None => Ok(load_dotenv()),
        }
    }

    pub fn config_manager(&self) -> ConfigManager {
        match &self.config {
            Some(path) => ConfigManager::new().with_config_path(path.clone()),
            None => ConfigManager::new(),
        }
    }

    /// Load the configuration, apply command-line overrides, then validate
    pub async fn load_config(&self) -> Result<AppConfiguration> {
        let mut config = self.config_manager().load().await?;
        self.apply_overrides(&mut config);
        ConfigManager::validate_config(&config)?;
        Ok(config)
    }

    /// Command-line flags take precedence over file and environment
    pub fn apply_overrides(&self, config: &mut AppConfiguration) {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.keep {
            config.cleanup.remove_job = false;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
    }

    /// Build the client, then create and delete the Job.
    ///
    /// Only client construction errors are returned; API errors end up in the
    /// report.
    pub async fn execute(&self, config: &AppConfiguration) -> Result<JobRunReport> {
        let kubeconfig = resolve_kubeconfig_path(self.kubeconfig.clone());
        let client = build_client(kubeconfig.as_deref()).await?;

        let run = RunContext::new();
        let job = config.job.to_k8s_job(&config.namespace, &run);
        info!(
            "Submitting job {} to namespace {} (run {})",
            config.job.name, config.namespace, run.run_id
        );

        let runner = KubernetesJobRunner::new(
            Arc::new(KubeJobApi::new(client, &config.namespace)),
            config.cleanup.clone(),
            config.dry_run,
        );
        let report = runner.run(&job).await;

        if !report.is_clean() {
            warn!("Job {} finished with errors", report.job_name);
        }
        Ok(report)
    }
}

/// Render the Job returned by the create call; nothing when create failed
pub fn render_job(job: Option<&K8sJob>, format: OutputFormat) -> Result<String> {
    let Some(job) = job else {
        return Ok(String::new());
    };
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(job)?,
        OutputFormat::Json => serde_json::to_string_pretty(job)?,
    };
    Ok(rendered)
}
