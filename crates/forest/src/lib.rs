//! Random forest classification: weighted CART trees, bootstrap bagging and
//! the small amount of evaluation plumbing the trainer needs.

pub mod error;
pub mod forest;
pub mod split;
pub mod tree;

pub use error::*;
pub use forest::*;
pub use split::*;
pub use tree::*;

/// Checks shape consistency and returns the feature count.
pub fn validate_training_set(x: &[Vec<f64>], y: &[usize]) -> Result<usize, ForestError> {
    if x.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    if x.len() != y.len() {
        return Err(ForestError::LabelMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    let n_features = x[0].len();
    if let Some((row, values)) = x.iter().enumerate().find(|(_, r)| r.len() != n_features) {
        return Err(ForestError::RaggedRow {
            row,
            expected: n_features,
            found: values.len(),
        });
    }
    Ok(n_features)
}
