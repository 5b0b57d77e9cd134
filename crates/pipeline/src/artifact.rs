use crate::encoding::CategoryEncoders;
use chrono::{DateTime, Utc};
use credit_forest::RandomForest;
use credit_models::{Feature, RiskError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub accuracy: f64,
    /// Training rows per class, indexed by label (`good` = 0, `bad` = 1).
    pub class_balance: Vec<usize>,
}

/// Everything needed to score an application, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub features: Vec<Feature>,
    pub encoders: CategoryEncoders,
    pub forest: RandomForest,
    pub report: TrainingReport,
}

/// An artifact read from disk plus a fingerprint of its bytes.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub artifact: ModelArtifact,
    pub fingerprint: String,
}

impl ModelArtifact {
    pub fn new(encoders: CategoryEncoders, forest: RandomForest, report: TrainingReport) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            trained_at: Utc::now(),
            features: Feature::ALL.to_vec(),
            encoders,
            forest,
            report,
        }
    }

    /// Writes the artifact and returns its fingerprint.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<String, RiskError> {
        let path = path.as_ref();
        let io_error = |reason: String| RiskError::ModelIo {
            path: path.display().to_string(),
            reason,
        };

        let bytes = serde_json::to_vec(self).map_err(|e| io_error(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(e.to_string()))?;
        }
        std::fs::write(path, &bytes).map_err(|e| io_error(e.to_string()))?;
        Ok(fingerprint(&bytes))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<LoadedModel, RiskError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| RiskError::ModelIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|e| RiskError::ModelFormat {
                reason: e.to_string(),
            })?;
        artifact.validate()?;

        Ok(LoadedModel {
            artifact,
            fingerprint: fingerprint(&bytes),
        })
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        if self.format_version != FORMAT_VERSION {
            return Err(RiskError::ModelFormat {
                reason: format!(
                    "format version {} is not supported (expected {})",
                    self.format_version, FORMAT_VERSION
                ),
            });
        }
        if self.features != Feature::ALL {
            return Err(RiskError::ModelFormat {
                reason: format!("unexpected feature list {:?}", self.features),
            });
        }
        if self.forest.n_features() != Feature::ALL.len() {
            return Err(RiskError::ModelFormat {
                reason: format!(
                    "forest expects {} features, application has {}",
                    self.forest.n_features(),
                    Feature::ALL.len()
                ),
            });
        }
        self.forest
            .validate()
            .map_err(|e| RiskError::ModelFormat {
                reason: e.to_string(),
            })?;
        if let Some(missing) = Feature::CATEGORICAL
            .iter()
            .find(|f| self.encoders.get(**f).is_none())
        {
            return Err(RiskError::ModelFormat {
                reason: format!("no encoder for {}", missing),
            });
        }
        Ok(())
    }
}

/// First 12 hex digits of the SHA-256 of the artifact bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest
        .iter()
        .take(6)
        .map(|b| format!("{:02x}", b))
        .collect()
}
