//! Everything between a raw German Credit ARFF file and a scored loan
//! application: parsing, label encoding, training, persistence and scoring.

pub mod artifact;
pub mod dataset;
pub mod encoding;
pub mod engine;
pub mod train;

pub use artifact::*;
pub use dataset::*;
pub use encoding::*;
pub use engine::*;
pub use train::*;
