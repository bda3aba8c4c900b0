use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum DeployError {
    IoError(std::io::Error),
    /// The variable manifest could not be opened or read.
    ManifestError {
        path: PathBuf,
        source: std::io::Error,
    },
    JsonError(serde_json::Error),
    YamlError(serde_yaml::Error),
    /// A listener rule priority that is neither `default` nor a positive integer.
    InvalidPriority(String),
    ConfigError(String),
    ValidationError(String),
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::IoError(e) => write!(f, "{}", e),
            DeployError::ManifestError { path, source } => {
                write!(f, "Cannot read manifest {}: {}", path.display(), source)
            }
            DeployError::JsonError(e) => write!(f, "{}", e),
            DeployError::YamlError(e) => write!(f, "{}", e),
            DeployError::InvalidPriority(p) => {
                write!(f, "Invalid listener rule priority: {:?}", p)
            }
            DeployError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            DeployError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DeployError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeployError::IoError(e) => Some(e),
            DeployError::ManifestError { source, .. } => Some(source),
            DeployError::JsonError(e) => Some(e),
            DeployError::YamlError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DeployError {
    fn from(err: std::io::Error) -> Self {
        DeployError::IoError(err)
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::JsonError(err)
    }
}

impl From<serde_yaml::Error> for DeployError {
    fn from(err: serde_yaml::Error) -> Self {
        DeployError::YamlError(err)
    }
}

impl From<validator::ValidationErrors> for DeployError {
    fn from(err: validator::ValidationErrors) -> Self {
        DeployError::ValidationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
