use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Invalid application: {reason}")]
    InvalidApplication { reason: String },

    #[error("Invalid dataset: {reason}")]
    InvalidDataset { reason: String },

    #[error("Failed to access model file {path}: {reason}")]
    ModelIo { path: String, reason: String },

    #[error("Unsupported model format: {reason}")]
    ModelFormat { reason: String },

    #[error("Training failed: {reason}")]
    Training { reason: String },

    #[error("Dataset download failed: {reason}")]
    Download { reason: String },

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl RiskError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            RiskError::ModelNotLoaded => "ModelUnavailable",
            RiskError::InvalidApplication { .. } => "ValidationError",
            RiskError::InvalidDataset { .. } => "InvalidDataset",
            RiskError::ModelIo { .. } => "ModelUnavailable",
            RiskError::ModelFormat { .. } => "ModelUnavailable",
            RiskError::Training { .. } => "TrainingError",
            RiskError::Download { .. } => "DownloadError",
            RiskError::ConfigError { .. } => "ServiceException",
            RiskError::InternalError { .. } => "ServiceException",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            RiskError::ModelNotLoaded => 500,
            RiskError::InvalidApplication { .. } => 422,
            RiskError::InvalidDataset { .. } => 400,
            RiskError::ModelIo { .. } => 500,
            RiskError::ModelFormat { .. } => 500,
            RiskError::Training { .. } => 500,
            RiskError::Download { .. } => 502,
            RiskError::ConfigError { .. } => 500,
            RiskError::InternalError { .. } => 500,
        }
    }
}
