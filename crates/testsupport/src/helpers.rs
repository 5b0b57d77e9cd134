use anyhow::Result;
use credit_forest::{ForestParams, MaxFeatures, TreeParams};
use credit_models::{canonical_categories, Feature, LoanApplication};
use credit_pipeline::{train, Dataset, ModelArtifact};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Applicants are bad when overdrawn on a long loan, or asking for a lot
/// with little savings.
pub fn is_bad(checking: &str, duration: f64, savings: &str, credit_amount: f64) -> bool {
    (checking == "<0" && duration > 24.0) || (savings == "<100" && credit_amount > 8000.0)
}

/// A credit-g shaped ARFF document with a deterministic labelling rule.
/// Every canonical category appears at least once.
pub fn synthetic_arff(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = String::from("% synthetic german credit\n@relation 'credit-g-synthetic'\n");

    let nominal = |feature: Feature| {
        let values: Vec<String> = canonical_categories(feature)
            .iter()
            .map(|v| format!("'{}'", v))
            .collect();
        format!("{{{}}}", values.join(", "))
    };
    let _ = writeln!(text, "@attribute checking_status {}", nominal(Feature::CheckingStatus));
    let _ = writeln!(text, "@attribute duration numeric");
    let _ = writeln!(text, "@attribute purpose {}", nominal(Feature::Purpose));
    let _ = writeln!(text, "@attribute credit_amount numeric");
    let _ = writeln!(text, "@attribute savings_status {}", nominal(Feature::SavingsStatus));
    let _ = writeln!(text, "@attribute age numeric");
    let _ = writeln!(text, "@attribute job {}", nominal(Feature::Job));
    let _ = writeln!(text, "@attribute class {{good, bad}}");
    text.push_str("@data\n");

    let pick = |feature: Feature, row: usize, rng: &mut StdRng| -> &'static str {
        let values = canonical_categories(feature);
        if row < values.len() {
            values[row]
        } else {
            values[rng.gen_range(0..values.len())]
        }
    };

    for row in 0..rows {
        let checking = pick(Feature::CheckingStatus, row, &mut rng);
        let purpose = pick(Feature::Purpose, row, &mut rng);
        let savings = pick(Feature::SavingsStatus, row, &mut rng);
        let job = pick(Feature::Job, row, &mut rng);
        let duration = (rng.gen_range(1..=12) * 6) as f64;
        let credit_amount = rng.gen_range(250..18_000) as f64;
        let age = rng.gen_range(19..75) as f64;
        let class = if is_bad(checking, duration, savings, credit_amount) {
            "bad"
        } else {
            "good"
        };
        let _ = writeln!(
            text,
            "'{}',{},'{}',{},'{}',{},'{}',{}",
            checking, duration, purpose, credit_amount, savings, age, job, class
        );
    }
    text
}

/// Small but otherwise default forest so tests stay fast.
pub fn test_params() -> ForestParams {
    ForestParams {
        n_estimators: 25,
        tree: TreeParams {
            max_depth: Some(10),
            max_features: MaxFeatures::Sqrt,
            ..ForestParams::default().tree
        },
        ..ForestParams::default()
    }
}

pub fn train_synthetic_model(rows: usize) -> Result<ModelArtifact> {
    let dataset = Dataset::from_arff(&synthetic_arff(rows, 7))?;
    Ok(train(&dataset, 0.2, test_params())?)
}

/// Trains on synthetic data and writes the artifact into `dir`.
pub fn write_synthetic_model(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("credit_risk_model.json");
    train_synthetic_model(600)?.save(&path)?;
    Ok(path)
}

/// Codes follow the sorted credit-g labels: checking `<0` is 1, savings `<100` is 2.
pub fn high_risk_application() -> LoanApplication {
    LoanApplication {
        duration: 60.0,
        credit_amount: 15_000.0,
        age: 25.0,
        job: 1,
        checking_status: 1,
        savings_status: 2,
        purpose: 4,
    }
}

/// Checking `no checking` is 3, savings `no known savings` is 4.
pub fn low_risk_application() -> LoanApplication {
    LoanApplication {
        duration: 12.0,
        credit_amount: 1_000.0,
        age: 45.0,
        job: 1,
        checking_status: 3,
        savings_status: 4,
        purpose: 9,
    }
}
