use serde::{Deserialize, Serialize};
use std::fmt;

/// Model inputs in the column order the forest is trained on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Duration,
    CreditAmount,
    Age,
    Job,
    CheckingStatus,
    SavingsStatus,
    Purpose,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Duration,
        Feature::CreditAmount,
        Feature::Age,
        Feature::Job,
        Feature::CheckingStatus,
        Feature::SavingsStatus,
        Feature::Purpose,
    ];

    pub const CATEGORICAL: [Feature; 4] = [
        Feature::Job,
        Feature::CheckingStatus,
        Feature::SavingsStatus,
        Feature::Purpose,
    ];

    /// Column name in the German Credit dataset.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Duration => "duration",
            Feature::CreditAmount => "credit_amount",
            Feature::Age => "age",
            Feature::Job => "job",
            Feature::CheckingStatus => "checking_status",
            Feature::SavingsStatus => "savings_status",
            Feature::Purpose => "purpose",
        }
    }

    pub fn is_categorical(&self) -> bool {
        Self::CATEGORICAL.contains(self)
    }

    /// Position of this feature in a model input row.
    pub fn column(&self) -> usize {
        match self {
            Feature::Duration => 0,
            Feature::CreditAmount => 1,
            Feature::Age => 2,
            Feature::Job => 3,
            Feature::CheckingStatus => 4,
            Feature::SavingsStatus => 5,
            Feature::Purpose => 6,
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Body of `POST /predict`. Categorical fields carry label-encoded codes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanApplication {
    /// Loan duration in months
    pub duration: f64,
    /// Total credit requested in DM
    pub credit_amount: f64,
    /// Applicant age in years
    pub age: f64,
    pub job: i64,
    pub checking_status: i64,
    pub savings_status: i64,
    pub purpose: i64,
}

impl LoanApplication {
    pub fn to_features(&self) -> [f64; 7] {
        [
            self.duration,
            self.credit_amount,
            self.age,
            self.job as f64,
            self.checking_status as f64,
            self.savings_status as f64,
            self.purpose as f64,
        ]
    }

    /// Returns the name of the first numeric field that is NaN or infinite.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("duration", self.duration),
            ("credit_amount", self.credit_amount),
            ("age", self.age),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Deny,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskClass {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "High Risk")]
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicantProfile {
    pub job_type: String,
    pub age: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub decision: Decision,
    /// Calibrated score in [0, 1], rounded to four decimals.
    pub risk_probability: f64,
    pub risk_class: RiskClass,
    pub applicant_profile: ApplicantProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}
