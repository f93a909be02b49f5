use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::entities::JobDescriptor;
use crate::error::{AppError, Result};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfiguration {
    /// Namespace the Job is submitted to
    pub namespace: String,
    pub job: JobDescriptor,
    pub cleanup: CleanupSettings,
    /// Send create and delete as server-side dry runs
    pub dry_run: bool,
    pub output: OutputFormat,
    pub logging: LoggingConfig,
}

/// What happens to the Job once it has been submitted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleanupSettings {
    /// Delete the Job right after creating it
    pub remove_job: bool,
    /// Propagation policy for dependents; server default when unset
    pub propagation_policy: Option<PropagationPolicy>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropagationPolicy {
    Background,
    Foreground,
    Orphan,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// compact, pretty or json
    pub format: String,
}

impl Default for AppConfiguration {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            job: JobDescriptor::default(),
            cleanup: CleanupSettings::default(),
            dry_run: false,
            output: OutputFormat::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            remove_job: true,
            propagation_policy: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(AppError::ConfigError(format!(
                "Unknown output format: {}",
                other
            ))),
        }
    }
}

/// Loads the configuration from defaults, an optional file and the environment
#[derive(Debug, Default)]
pub struct ConfigManager {
    config_path: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit config file instead of `CONFIG_FILE`
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Config file in use: the explicit path, else `CONFIG_FILE`
    pub fn resolved_path(&self) -> Option<String> {
        self.config_path
            .clone()
            .or_else(|| std::env::var("CONFIG_FILE").ok())
            .filter(|p| !p.is_empty())
    }

    /// Load configuration: defaults, then config file, then environment variables.
    ///
    /// The result is not validated yet; callers validate once all overrides
    /// are applied.
    pub async fn load(&self) -> Result<AppConfiguration> {
        let mut config = match self.resolved_path() {
            Some(path) => Self::load_from_file(&path).await?,
            None => AppConfiguration::default(),
        };

        Self::load_from_env(&mut config)?;
        Ok(config)
    }

    /// Read a `.yaml`, `.yml` or `.json` config file
    pub async fn load_from_file(path: &str) -> Result<AppConfiguration> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::ConfigError(format!("Failed to read config file {}: {}", path, e))
        })?;

        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        let config: AppConfiguration = match extension {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Invalid YAML config: {}", e)))?,
            "json" => serde_json::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Invalid JSON config: {}", e)))?,
            _ => {
                return Err(AppError::ConfigError(
                    "Config file must be .yaml, .yml, or .json".to_string(),
                ))
            }
        };

        Ok(config)
    }

    /// Apply environment variable overrides
    fn load_from_env(config: &mut AppConfiguration) -> Result<()> {
        if let Ok(namespace) = std::env::var("JOB_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Ok(name) = std::env::var("JOB_NAME") {
            config.job.name = name;
        }
        if let Ok(image) = std::env::var("JOB_IMAGE") {
            config.job.image = image;
        }
        if let Ok(tag) = std::env::var("JOB_IMAGE_TAG") {
            config.job.tag = tag;
        }
        if let Ok(command) = std::env::var("JOB_COMMAND") {
            config.job.command = command.split_whitespace().map(str::to_string).collect();
        }
        if let Ok(dry_run) = std::env::var("JOB_DRY_RUN") {
            config.dry_run = dry_run
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid JOB_DRY_RUN: {}", e)))?;
        }
        if let Ok(output) = std::env::var("JOB_OUTPUT") {
            config.output = output.parse()?;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate_config(config: &AppConfiguration) -> Result<()> {
        if config.namespace.trim().is_empty() {
            return Err(AppError::ConfigError("Namespace is required".to_string()));
        }

        config.job.validate()?;

        match config.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(AppError::ConfigError("Invalid log level".to_string())),
        }

        match config.logging.format.as_str() {
            "compact" | "pretty" | "json" => {}
            _ => return Err(AppError::ConfigError("Invalid log format".to_string())),
        }

        Ok(())
    }
}

/// Every variable the loader reads
#[cfg(test)]
pub(crate) const CONFIG_ENV_VARS: &[&str] = &[
    "CONFIG_FILE",
    "JOB_NAMESPACE",
    "JOB_NAME",
    "JOB_IMAGE",
    "JOB_IMAGE_TAG",
    "JOB_COMMAND",
    "JOB_DRY_RUN",
    "JOB_OUTPUT",
    "LOG_LEVEL",
    "LOG_FORMAT",
];

#[cfg(test)]
pub(crate) fn clear_config_env() {
    for var in CONFIG_ENV_VARS {
        std::env::remove_var(var);
    }
}

#[cfg(test)]
pub(crate) fn temp_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_match_builtin_job() {
        let config = AppConfiguration::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.job.name, "job-name");
        assert_eq!(config.job.image_reference(), "image_url:imagetag");
        assert!(config.cleanup.remove_job);
        assert_eq!(config.cleanup.propagation_policy, None);
        assert!(!config.dry_run);
        assert_eq!(config.output, OutputFormat::Yaml);
    }

    #[tokio::test]
    async fn test_config_from_yaml_file() {
        let file = temp_config(
            ".yaml",
            r#"
namespace: batch
job:
  name: migrate
  tag: "1.4.2"
cleanup:
  propagation_policy: background
output: json
"#,
        );

        let config = ConfigManager::load_from_file(file.path().to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(config.namespace, "batch");
        assert_eq!(config.job.name, "migrate");
        assert_eq!(config.job.image_reference(), "image_url:1.4.2");
        assert_eq!(config.job.command, vec!["python", "manage.py", "migrate"]);
        assert!(config.cleanup.remove_job);
        assert_eq!(
            config.cleanup.propagation_policy,
            Some(PropagationPolicy::Background)
        );
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[tokio::test]
    async fn test_config_from_json_file() {
        let file = temp_config(".json", r#"{"dry_run": true, "cleanup": {"remove_job": false}}"#);

        let config = ConfigManager::load_from_file(file.path().to_str().unwrap())
            .await
            .unwrap();

        assert!(config.dry_run);
        assert!(!config.cleanup.remove_job);
        assert_eq!(config.job, JobDescriptor::default());
    }

    #[tokio::test]
    async fn test_config_file_with_unknown_extension_is_rejected() {
        let file = temp_config(".toml", "namespace = 'x'");

        let result = ConfigManager::load_from_file(file.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_config_file() {
        clear_config_env();
        let result = ConfigManager::new()
            .with_config_path("/nonexistent/kube-job-runner.yaml")
            .load()
            .await;
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfiguration::default();
        assert!(ConfigManager::validate_config(&config).is_ok());

        config.logging.level = "verbose".to_string();
        assert!(ConfigManager::validate_config(&config).is_err());

        let mut config = AppConfiguration::default();
        config.namespace = String::new();
        assert!(ConfigManager::validate_config(&config).is_err());

        let mut config = AppConfiguration::default();
        config.job.image = String::new();
        assert!(matches!(
            ConfigManager::validate_config(&config),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[tokio::test]
    #[serial]
    async fn test_environment_overrides_config_file() {
        clear_config_env();
        let file = temp_config(
            ".yaml",
            r#"
namespace: from-file
job:
  name: file-job
  image: registry.local/file
  tag: "1.0"
"#,
        );

        std::env::set_var("CONFIG_FILE", file.path().to_str().unwrap());
        std::env::set_var("JOB_NAMESPACE", "from-env");
        std::env::set_var("JOB_IMAGE", "registry.local/env");
        std::env::set_var("JOB_COMMAND", "./manage  migrate --noinput");
        std::env::set_var("JOB_OUTPUT", "json");
        std::env::set_var("LOG_LEVEL", "debug");

        let manager = ConfigManager::new();
        assert_eq!(manager.resolved_path().as_deref(), file.path().to_str());
        let config = manager.load().await.unwrap();
        clear_config_env();

        assert_eq!(config.namespace, "from-env");
        assert_eq!(config.job.name, "file-job");
        assert_eq!(config.job.image_reference(), "registry.local/env:1.0");
        assert_eq!(config.job.command, vec!["./manage", "migrate", "--noinput"]);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert!(ConfigManager::validate_config(&config).is_ok());
    }

    #[tokio::test]
    #[serial]
    async fn test_environment_overrides_defaults_without_file() {
        clear_config_env();
        std::env::set_var("JOB_NAME", "cleanup");
        std::env::set_var("JOB_IMAGE_TAG", "2024.06");
        std::env::set_var("JOB_DRY_RUN", "true");

        let config = ConfigManager::new().load().await.unwrap();
        clear_config_env();

        assert_eq!(config.namespace, "default");
        assert_eq!(config.job.name, "cleanup");
        assert_eq!(config.job.image_reference(), "image_url:2024.06");
        assert!(config.dry_run);
    }

    #[tokio::test]
    #[serial]
    async fn test_invalid_dry_run_variable_is_rejected() {
        clear_config_env();
        std::env::set_var("JOB_DRY_RUN", "sometimes");

        let result = ConfigManager::new().load().await;
        clear_config_env();

        assert!(matches!(
            result,
            Err(AppError::ConfigError(msg)) if msg.contains("JOB_DRY_RUN")
        ));
    }

    #[tokio::test]
    #[serial]
    async fn test_invalid_output_variable_is_rejected() {
        clear_config_env();
        std::env::set_var("JOB_OUTPUT", "table");

        let result = ConfigManager::new().load().await;
        clear_config_env();

        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_command_variable_fails_validation() {
        clear_config_env();
        std::env::set_var("JOB_COMMAND", "   ");

        let config = ConfigManager::new().load().await.unwrap();
        clear_config_env();

        assert!(config.job.command.is_empty());
        assert!(matches!(
            ConfigManager::validate_config(&config),
            Err(AppError::ValidationError(_))
        ));
    }
}
