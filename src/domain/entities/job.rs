//! Job descriptor entity
//!
//! A `JobDescriptor` describes a run-to-completion workload with a single
//! container and a list of environment sources. It is turned into a
//! `batch/v1` Job right before submission.

use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::{Job as K8sJob, JobSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, Container, EnvFromSource, PodSpec, PodTemplateSpec, SecretEnvSource,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "kube-job-runner";
pub const RUN_ID_LABEL: &str = "kube-job-runner/run-id";
pub const SUBMITTED_AT_ANNOTATION: &str = "kube-job-runner/submitted-at";

/// Kind of key-value source merged into the container environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnvSourceKind {
    ConfigMap,
    Secret,
}

/// Named environment source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvSource {
    pub kind: EnvSourceKind,
    pub name: String,
    /// Prefix prepended to every key; empty means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl EnvSource {
    pub fn config_map(name: impl Into<String>) -> Self {
        Self {
            kind: EnvSourceKind::ConfigMap,
            name: name.into(),
            prefix: None,
        }
    }

    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            kind: EnvSourceKind::Secret,
            name: name.into(),
            prefix: None,
        }
    }

    fn to_k8s(&self) -> EnvFromSource {
        let prefix = self.prefix.clone().filter(|p| !p.is_empty());
        match self.kind {
            EnvSourceKind::ConfigMap => EnvFromSource {
                prefix,
                config_map_ref: Some(ConfigMapEnvSource {
                    name: Some(self.name.clone()),
                    optional: None,
                }),
                secret_ref: None,
            },
            EnvSourceKind::Secret => EnvFromSource {
                prefix,
                config_map_ref: None,
                secret_ref: Some(SecretEnvSource {
                    name: Some(self.name.clone()),
                    optional: None,
                }),
            },
        }
    }
}

/// Job descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobDescriptor {
    /// Job name, also used as the container name
    pub name: String,
    /// Image repository without tag
    pub image: String,
    /// Image tag
    pub tag: String,
    /// Container command
    pub command: Vec<String>,
    /// Pod restart policy
    pub restart_policy: String,
    /// Environment sources, in the order they are merged
    pub env_from: Vec<EnvSource>,
}

impl Default for JobDescriptor {
    fn default() -> Self {
        Self {
            name: "job-name".to_string(),
            image: "image_url".to_string(),
            tag: "imagetag".to_string(),
            command: vec![
                "python".to_string(),
                "manage.py".to_string(),
                "migrate".to_string(),
            ],
            restart_policy: "Never".to_string(),
            env_from: vec![
                EnvSource::config_map("config-name"),
                EnvSource::secret("secret-name"),
            ],
        }
    }
}

/// Per-invocation metadata stamped onto the submitted Job
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub run_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            submitted_at: Utc::now(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl JobDescriptor {
    /// Full image reference, `image:tag` or the bare image when no tag is set
    pub fn image_reference(&self) -> String {
        if self.tag.is_empty() {
            self.image.clone()
        } else {
            format!("{}:{}", self.image, self.tag)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Job name must not be empty".to_string(),
            ));
        }
        if self.image.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Job image must not be empty".to_string(),
            ));
        }
        if self.command.is_empty() {
            return Err(AppError::ValidationError(
                "Job command must not be empty".to_string(),
            ));
        }
        if let Some(source) = self.env_from.iter().find(|s| s.name.trim().is_empty()) {
            return Err(AppError::ValidationError(format!(
                "{:?} environment source has an empty name",
                source.kind
            )));
        }
        Ok(())
    }

    /// Build the `batch/v1` Job sent to the API server
    pub fn to_k8s_job(&self, namespace: &str, run: &RunContext) -> K8sJob {
        let labels: BTreeMap<String, String> = [
            (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
            (RUN_ID_LABEL.to_string(), run.run_id.to_string()),
        ]
        .into_iter()
        .collect();

        let container = Container {
            name: self.name.clone(),
            image: Some(self.image_reference()),
            command: Some(self.command.clone()),
            env_from: if self.env_from.is_empty() {
                None
            } else {
                Some(self.env_from.iter().map(EnvSource::to_k8s).collect())
            },
            ..Default::default()
        };

        let pod_template = PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(labels.clone()),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![container],
                restart_policy: Some(self.restart_policy.clone()),
                ..Default::default()
            }),
        };

        K8sJob {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels),
                annotations: Some(
                    [(
                        SUBMITTED_AT_ANNOTATION.to_string(),
                        run.submitted_at.to_rfc3339(),
                    )]
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            },
            spec: Some(JobSpec {
                template: pod_template,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
