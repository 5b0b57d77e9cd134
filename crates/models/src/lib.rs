pub mod application;
pub mod codebook;
pub mod config;
pub mod error;

pub use application::*;
pub use codebook::*;
pub use config::*;
pub use error::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_loan_application_feature_order() {
        let application = LoanApplication {
            duration: 24.0,
            credit_amount: 5000.0,
            age: 30.0,
            job: 1,
            checking_status: 0,
            savings_status: 2,
            purpose: 5,
        };

        let row = application.to_features();
        assert_eq!(row, [24.0, 5000.0, 30.0, 1.0, 0.0, 2.0, 5.0]);
        for feature in Feature::ALL {
            assert_eq!(Feature::ALL[feature.column()], feature);
        }
    }

    #[test]
    fn test_loan_application_requires_all_fields() {
        let json = r#"{"duration": 12, "credit_amount": 1000, "age": 40}"#;
        let result: Result<LoanApplication, _> = serde_json::from_str(json);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("missing field"));
    }

    #[test]
    fn test_loan_application_accepts_integer_numbers() {
        let json = r#"{
            "duration": 12, "credit_amount": 1000, "age": 40,
            "job": 1, "checking_status": 3, "savings_status": 0, "purpose": 4
        }"#;
        let application: LoanApplication = serde_json::from_str(json).unwrap();
        assert_eq!(application.duration, 12.0);
        assert_eq!(application.first_non_finite(), None);
    }

    #[test]
    fn test_first_non_finite_names_the_field() {
        let mut application = LoanApplication {
            duration: 12.0,
            credit_amount: 1000.0,
            age: 40.0,
            job: 1,
            checking_status: 3,
            savings_status: 0,
            purpose: 4,
        };
        application.age = f64::NAN;
        assert_eq!(application.first_non_finite(), Some("age"));
        application.duration = f64::NEG_INFINITY;
        assert_eq!(application.first_non_finite(), Some("duration"));
    }

    #[test]
    fn test_prediction_response_wire_format() {
        let response = PredictionResponse {
            decision: Decision::Deny,
            risk_probability: 0.8123,
            risk_class: RiskClass::High,
            applicant_profile: ApplicantProfile {
                job_type: "Skilled Employee".to_string(),
                age: 30.0,
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["decision"], "DENY");
        assert_eq!(value["risk_class"], "High Risk");
        assert_eq!(value["applicant_profile"]["job_type"], "Skilled Employee");
    }

    #[test]
    fn test_canonical_code_book_uses_sorted_labels() {
        let book = CodeBook::canonical();

        assert_eq!(book.describe(Feature::Job, 0), Some("High Qualification / Management"));
        assert_eq!(book.describe(Feature::Job, 3), Some("Unskilled (Resident)"));
        assert_eq!(
            book.describe(Feature::CheckingStatus, 1),
            Some("< 0 DM (Overdrawn / High Risk)")
        );
        assert_eq!(book.describe(Feature::CheckingStatus, 3), Some("No Checking Account (Safe)"));
        assert_eq!(book.describe(Feature::Purpose, 0), Some("Business"));
        assert_eq!(book.describe(Feature::Purpose, 9), Some("Used Car"));
        assert_eq!(book.codes(Feature::SavingsStatus).map(|c| c.len()), Some(5));
        assert_eq!(book.describe(Feature::Job, 4), None);
        assert_eq!(book.describe(Feature::Job, -1), None);
    }

    #[test]
    fn test_code_book_serializes_string_keys() {
        let value = serde_json::to_value(StatusResponse::online(CodeBook::canonical())).unwrap();
        assert_eq!(value["status"], "online");
        assert_eq!(value["reference_codes"]["job"]["1"], "Skilled Employee");
    }

    #[test]
    fn test_unknown_label_falls_back_to_raw_text() {
        let labels = ["skilled", "astronaut"];
        let book = CodeBook::from_labels([(Feature::Job, &labels[..])]);
        assert_eq!(book.describe(Feature::Job, 1), Some("astronaut"));
    }

    #[test]
    fn test_error_http_mapping() {
        assert_eq!(RiskError::ModelNotLoaded.http_status(), 500);
        assert_eq!(RiskError::ModelNotLoaded.to_error_shape().error_message, "Model not loaded");
        let invalid = RiskError::InvalidApplication { reason: "age is NaN".into() };
        assert_eq!(invalid.http_status(), 422);
        assert_eq!(invalid.error_type(), "ValidationError");
    }
}
