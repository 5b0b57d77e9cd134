use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForestError {
    #[error("Training set is empty")]
    EmptyDataset,

    #[error("Row {row} has {found} features, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    #[error("Got {rows} rows but {labels} labels")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("Label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("Training labels contain a single class")]
    SingleClass,

    #[error("Invalid parameter: {reason}")]
    InvalidParams { reason: String },

    #[error("Model expects {expected} features, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("Malformed tree: {reason}")]
    MalformedTree { reason: String },
}
