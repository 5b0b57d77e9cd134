use crate::dataset::{Column, Frame};
use credit_models::{CodeBook, Feature, RiskError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps category labels to their index in byte-order sorted label list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Self {
        let mut classes: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    pub fn inverse(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// One encoder per categorical feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CategoryEncoders(BTreeMap<Feature, LabelEncoder>);

impl CategoryEncoders {
    pub fn fit(frame: &Frame) -> Self {
        let encoders = frame
            .columns
            .iter()
            .filter_map(|(feature, column)| match column {
                Column::Categorical(values) => Some((*feature, LabelEncoder::fit(values))),
                Column::Numeric(_) => None,
            })
            .collect();
        Self(encoders)
    }

    pub fn get(&self, feature: Feature) -> Option<&LabelEncoder> {
        self.0.get(&feature)
    }

    /// Row-major numeric matrix with categorical columns replaced by codes.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<Vec<f64>>, RiskError> {
        let mut rows = vec![Vec::with_capacity(frame.columns.len()); frame.len()];
        for (feature, column) in &frame.columns {
            match column {
                Column::Numeric(values) => {
                    for (row, value) in rows.iter_mut().zip(values) {
                        row.push(*value);
                    }
                }
                Column::Categorical(values) => {
                    let encoder = self.get(*feature).ok_or_else(|| RiskError::InvalidDataset {
                        reason: format!("no encoder fitted for {}", feature),
                    })?;
                    for (row, value) in rows.iter_mut().zip(values) {
                        let code = encoder.transform(value).ok_or_else(|| {
                            RiskError::InvalidDataset {
                                reason: format!("unseen {} label '{}'", feature, value),
                            }
                        })?;
                        row.push(code as f64);
                    }
                }
            }
        }
        Ok(rows)
    }

    pub fn code_book(&self) -> CodeBook {
        CodeBook::from_labels(
            self.0
                .iter()
                .map(|(feature, encoder)| (*feature, encoder.classes())),
        )
    }

    /// `label -> code` for a feature, as logged after training.
    pub fn mapping(&self, feature: Feature) -> BTreeMap<&str, usize> {
        self.get(feature)
            .map(|encoder| {
                encoder
                    .classes()
                    .iter()
                    .enumerate()
                    .map(|(code, label)| (label.as_str(), code))
                    .collect()
            })
            .unwrap_or_default()
    }
}
