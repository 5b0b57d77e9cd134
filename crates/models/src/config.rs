use crate::RiskError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables with this prefix override file settings,
/// e.g. `CREDIT_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "CREDIT_";

const SECTIONS: [&str; 5] = ["server", "model", "scoring", "training", "logging"];

/// Whether a prefix-stripped environment key (`SERVER__PORT`) targets a
/// config section. Other `CREDIT_*` variables are ignored.
fn is_section_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECTIONS.iter().any(|section| {
        key.strip_prefix(section)
            .is_some_and(|rest| rest.starts_with("__"))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub max_request_body_size_kb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Raw probability mapped to a calibrated score of 0.
    pub calibration_floor: f64,
    /// Raw probability mapped to a calibrated score of 1.
    pub calibration_ceiling: f64,
    /// Calibrated scores strictly above this are denied.
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfig {
    pub dataset_path: String,
    pub dataset_url: String,
    pub test_size: f64,
    pub n_estimators: usize,
    /// 0 grows trees until leaves are pure.
    pub max_depth: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8000,
                max_request_body_size_kb: 64,
            },
            model: ModelConfig {
                path: "credit_risk_model.json".to_string(),
            },
            scoring: ScoringConfig::default(),
            training: TrainingConfig {
                dataset_path: "data/credit-g.arff".to_string(),
                dataset_url: "https://www.openml.org/data/download/31/dataset_31_credit-g.arff"
                    .to_string(),
                test_size: 0.2,
                n_estimators: 200,
                max_depth: 15,
                seed: 42,
            },
            logging: LoggingConfig {
                format: LogFormat::Pretty,
            },
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            calibration_floor: 0.0,
            calibration_ceiling: 0.7,
            threshold: 0.5,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (if it exists), then `CREDIT_*` env vars.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self, RiskError> {
        let config: Config = Self::figment(config_path.as_ref())
            .extract()
            .map_err(|e| RiskError::ConfigError {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .filter(|key| is_section_key(key.as_str()))
                    .split("__"),
            )
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        self.scoring.validate()?;

        let training = &self.training;
        if !(training.test_size > 0.0 && training.test_size < 1.0) {
            return Err(RiskError::ConfigError {
                reason: format!(
                    "training.test_size must be between 0 and 1 (exclusive), got {}",
                    training.test_size
                ),
            });
        }
        if training.n_estimators == 0 {
            return Err(RiskError::ConfigError {
                reason: "training.n_estimators must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), RiskError> {
        if !(self.calibration_ceiling > self.calibration_floor) {
            return Err(RiskError::ConfigError {
                reason: format!(
                    "scoring.calibration_ceiling ({}) must be greater than calibration_floor ({})",
                    self.calibration_ceiling, self.calibration_floor
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RiskError::ConfigError {
                reason: format!("scoring.threshold must be within [0, 1], got {}", self.threshold),
            });
        }
        Ok(())
    }
}
