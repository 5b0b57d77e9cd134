use crate::artifact::{LoadedModel, ModelArtifact};
use credit_models::{
    ApplicantProfile, CodeBook, Decision, Feature, LoanApplication, PredictionResponse, RiskClass,
    RiskError, ScoringConfig,
};
use std::path::Path;
use tracing::{info, warn};

/// Label index of the `bad` class.
const DEFAULT_CLASS: usize = 1;

/// Scores loan applications against an optional trained model.
///
/// The engine is immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    model: Option<LoadedModel>,
    scoring: ScoringConfig,
    code_book: CodeBook,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub raw: f64,
    pub calibrated: f64,
}

impl RiskEngine {
    pub fn new(model: Option<LoadedModel>, scoring: ScoringConfig) -> Self {
        let code_book = model
            .as_ref()
            .map(|m| m.artifact.encoders.code_book())
            .unwrap_or_else(CodeBook::canonical);
        Self {
            model,
            scoring,
            code_book,
        }
    }

    /// A missing or unreadable model is logged and leaves the engine
    /// unloaded; `/predict` then reports `ModelNotLoaded`.
    pub fn load_or_empty(path: impl AsRef<Path>, scoring: ScoringConfig) -> Self {
        let path = path.as_ref();
        match ModelArtifact::load(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    fingerprint = %model.fingerprint,
                    trees = model.artifact.forest.n_trees(),
                    accuracy = model.artifact.report.accuracy,
                    "Model loaded"
                );
                Self::new(Some(model), scoring)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Model not loaded");
                Self::new(None, scoring)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model.as_ref().map(|m| m.fingerprint.as_str())
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn code_book(&self) -> &CodeBook {
        &self.code_book
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn score(&self, application: &LoanApplication) -> Result<Score, RiskError> {
        let model = self.model.as_ref().ok_or(RiskError::ModelNotLoaded)?;
        if let Some(field) = application.first_non_finite() {
            return Err(RiskError::InvalidApplication {
                reason: format!("{} must be a finite number", field),
            });
        }

        let proba = model
            .artifact
            .forest
            .predict_proba(&application.to_features())
            .map_err(|e| RiskError::InternalError {
                reason: e.to_string(),
            })?;
        let raw = proba.get(DEFAULT_CLASS).copied().unwrap_or(0.0);
        Ok(Score {
            raw,
            calibrated: calibrate(raw, &self.scoring),
        })
    }

    pub fn predict(&self, application: &LoanApplication) -> Result<PredictionResponse, RiskError> {
        self.assess(application).map(|(response, _)| response)
    }

    /// Prediction plus the raw and calibrated scores behind it.
    pub fn assess(
        &self,
        application: &LoanApplication,
    ) -> Result<(PredictionResponse, Score), RiskError> {
        let score = self.score(application)?;
        let (decision, risk_class) = decide(score.calibrated, self.scoring.threshold);
        let job_type = self
            .code_book
            .describe(Feature::Job, application.job)
            .unwrap_or("Unknown")
            .to_string();

        let response = PredictionResponse {
            decision,
            risk_probability: round4(score.calibrated),
            risk_class,
            applicant_profile: ApplicantProfile {
                job_type,
                age: application.age,
            },
        };
        Ok((response, score))
    }
}

/// Only scores strictly above the threshold are denied.
pub fn decide(calibrated: f64, threshold: f64) -> (Decision, RiskClass) {
    if calibrated > threshold {
        (Decision::Deny, RiskClass::High)
    } else {
        (Decision::Approve, RiskClass::Low)
    }
}

/// Linearly maps `[floor, ceiling]` onto `[0, 1]` and clips.
pub fn calibrate(raw: f64, scoring: &ScoringConfig) -> f64 {
    let span = scoring.calibration_ceiling - scoring.calibration_floor;
    if span <= 0.0 {
        return raw.clamp(0.0, 1.0);
    }
    ((raw - scoring.calibration_floor) / span).clamp(0.0, 1.0)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_stretches_and_clips() {
        let scoring = ScoringConfig::default();
        assert_eq!(calibrate(0.0, &scoring), 0.0);
        assert!((calibrate(0.35, &scoring) - 0.5).abs() < 1e-12);
        assert_eq!(calibrate(0.7, &scoring), 1.0);
        assert_eq!(calibrate(0.95, &scoring), 1.0);

        let shifted = ScoringConfig {
            calibration_floor: 0.1,
            calibration_ceiling: 0.5,
            threshold: 0.5,
        };
        assert_eq!(calibrate(0.05, &shifted), 0.0);
        assert!((calibrate(0.3, &shifted) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn score_at_threshold_is_approved() {
        assert_eq!(decide(0.5, 0.5), (Decision::Approve, RiskClass::Low));
        assert_eq!(decide(0.5001, 0.5), (Decision::Deny, RiskClass::High));
        assert_eq!(decide(0.0, 0.0), (Decision::Approve, RiskClass::Low));
        assert_eq!(decide(1.0, 1.0), (Decision::Approve, RiskClass::Low));

        // A raw 0.35 calibrates onto the default threshold exactly.
        let scoring = ScoringConfig::default();
        let calibrated = calibrate(0.35, &scoring);
        assert_eq!(calibrated, scoring.threshold);
        assert_eq!(decide(calibrated, scoring.threshold).0, Decision::Approve);
    }

    #[test]
    fn rounding_keeps_four_decimals() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }

    #[test]
    fn unloaded_engine_reports_model_not_loaded() {
        let engine = RiskEngine::new(None, ScoringConfig::default());
        let application = LoanApplication {
            duration: 24.0,
            credit_amount: 5000.0,
            age: 30.0,
            job: 1,
            checking_status: 0,
            savings_status: 0,
            purpose: 5,
        };

        assert!(!engine.is_loaded());
        assert!(matches!(
            engine.predict(&application),
            Err(RiskError::ModelNotLoaded)
        ));
        assert_eq!(engine.code_book(), &CodeBook::canonical());
    }

    #[test]
    fn missing_model_file_leaves_engine_empty() {
        let engine =
            RiskEngine::load_or_empty("/nonexistent/credit_risk_model.json", ScoringConfig::default());
        assert!(!engine.is_loaded());
        assert_eq!(engine.model_version(), None);
    }
}
