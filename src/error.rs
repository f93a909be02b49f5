#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Kubeconfig error: {0}")]
    KubeConfig(String),

    #[error("Kubernetes API error: {message}")]
    KubernetesApi {
        /// HTTP status from the API server, when it answered at all
        code: Option<u16>,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<kube::Error> for AppError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => AppError::KubernetesApi {
                code: Some(response.code),
                message: format!(
                    "{} ({}, code {})",
                    response.message, response.reason, response.code
                ),
            },
            other => AppError::KubernetesApi {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

impl AppError {
    pub fn api(code: u16, message: impl Into<String>) -> Self {
        AppError::KubernetesApi {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Whether the API server answered with 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::KubernetesApi { code: Some(404), .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
