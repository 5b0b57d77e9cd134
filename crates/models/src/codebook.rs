use crate::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category labels exactly as they appear in the German Credit (credit-g) dataset.
pub fn canonical_categories(feature: Feature) -> &'static [&'static str] {
    match feature {
        Feature::Job => &[
            "unemp/unskilled non res",
            "unskilled resident",
            "skilled",
            "high qualif/self emp/mgmt",
        ],
        Feature::CheckingStatus => &["<0", "0<=X<200", ">=200", "no checking"],
        Feature::SavingsStatus => &[
            "<100",
            "100<=X<500",
            "500<=X<1000",
            ">=1000",
            "no known savings",
        ],
        Feature::Purpose => &[
            "new car",
            "used car",
            "furniture/equipment",
            "radio/tv",
            "domestic appliance",
            "repairs",
            "education",
            "vacation",
            "retraining",
            "business",
            "other",
        ],
        Feature::Duration | Feature::CreditAmount | Feature::Age => &[],
    }
}

/// Human-readable description of a raw dataset label.
pub fn describe_label(feature: Feature, raw: &str) -> Option<&'static str> {
    let text = match (feature, raw) {
        (Feature::Job, "high qualif/self emp/mgmt") => "High Qualification / Management",
        (Feature::Job, "skilled") => "Skilled Employee",
        (Feature::Job, "unemp/unskilled non res") => "Unemployed / Unskilled (Non-resident)",
        (Feature::Job, "unskilled resident") => "Unskilled (Resident)",

        (Feature::CheckingStatus, "0<=X<200") => "0 <= X < 200 DM (Medium Risk)",
        (Feature::CheckingStatus, "<0") => "< 0 DM (Overdrawn / High Risk)",
        (Feature::CheckingStatus, ">=200") => ">= 200 DM (Low Risk)",
        (Feature::CheckingStatus, "no checking") => "No Checking Account (Safe)",

        (Feature::SavingsStatus, "<100") => "< 100 DM (Little / None)",
        (Feature::SavingsStatus, "100<=X<500") => "100 <= X < 500 DM (Moderate)",
        (Feature::SavingsStatus, "500<=X<1000") => "500 <= X < 1000 DM (Substantial)",
        (Feature::SavingsStatus, ">=1000") => ">= 1000 DM (Rich)",
        (Feature::SavingsStatus, "no known savings") => "No Known Savings",

        (Feature::Purpose, "business") => "Business",
        (Feature::Purpose, "domestic appliance") => "Domestic Appliances",
        (Feature::Purpose, "education") => "Education",
        (Feature::Purpose, "furniture/equipment") => "Furniture/Equipment",
        (Feature::Purpose, "new car") => "New Car",
        (Feature::Purpose, "used car") => "Used Car",
        (Feature::Purpose, "radio/tv") => "Radio/TV",
        (Feature::Purpose, "repairs") => "Repairs",
        (Feature::Purpose, "retraining") => "Retraining",
        (Feature::Purpose, "vacation") => "Vacation",
        (Feature::Purpose, "other") => "Other",
        _ => return None,
    };
    Some(text)
}

/// Reference codes for every categorical feature: `feature -> code -> description`.
///
/// Codes are the label-encoder indices, so the book must be built from the
/// same sorted label lists the model was trained with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CodeBook(BTreeMap<String, BTreeMap<u32, String>>);

impl CodeBook {
    /// `labels` must already be in encoder order (index == code).
    pub fn from_labels<'a, I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Feature, &'a [S])>,
        S: AsRef<str> + 'a,
    {
        let mut book = BTreeMap::new();
        for (feature, labels) in entries {
            let codes = labels
                .iter()
                .enumerate()
                .map(|(code, raw)| {
                    let raw = raw.as_ref();
                    let text = describe_label(feature, raw).unwrap_or(raw);
                    (code as u32, text.to_string())
                })
                .collect();
            book.insert(feature.name().to_string(), codes);
        }
        Self(book)
    }

    /// Code book for the canonical credit-g categories, sorted the way a
    /// label encoder sorts them.
    pub fn canonical() -> Self {
        let sorted: Vec<(Feature, Vec<&str>)> = Feature::CATEGORICAL
            .iter()
            .map(|&feature| {
                let mut labels = canonical_categories(feature).to_vec();
                labels.sort_unstable();
                (feature, labels)
            })
            .collect();
        Self::from_labels(sorted.iter().map(|(f, labels)| (*f, labels.as_slice())))
    }

    pub fn describe(&self, feature: Feature, code: i64) -> Option<&str> {
        let code = u32::try_from(code).ok()?;
        self.0
            .get(feature.name())
            .and_then(|codes| codes.get(&code))
            .map(String::as_str)
    }

    pub fn codes(&self, feature: Feature) -> Option<&BTreeMap<u32, String>> {
        self.0.get(feature.name())
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
    pub reference_codes: CodeBook,
}

impl StatusResponse {
    pub fn online(reference_codes: CodeBook) -> Self {
        Self {
            status: "online".to_string(),
            reference_codes,
        }
    }
}
