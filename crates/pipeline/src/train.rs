use crate::artifact::{ModelArtifact, TrainingReport};
use crate::dataset::{Dataset, TARGET_COLUMN};
use crate::encoding::CategoryEncoders;
use credit_forest::{class_counts, train_test_split, ForestParams, RandomForest};
use credit_models::{Config, Feature, RiskError};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum DatasetSource {
    File(PathBuf),
    /// Download, caching to `cache` when set.
    Remote { url: String, cache: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub source: DatasetSource,
    pub output: PathBuf,
    pub test_size: f64,
    pub params: ForestParams,
}

impl TrainingOptions {
    pub fn from_config(config: &Config) -> Self {
        let training = &config.training;
        let mut params = ForestParams {
            n_estimators: training.n_estimators,
            seed: training.seed,
            ..ForestParams::default()
        };
        params.tree.max_depth = (training.max_depth > 0).then_some(training.max_depth);

        Self {
            source: DatasetSource::File(PathBuf::from(&training.dataset_path)),
            output: PathBuf::from(&config.model.path),
            test_size: training.test_size,
            params,
        }
    }
}

fn training_error(e: impl ToString) -> RiskError {
    RiskError::Training {
        reason: e.to_string(),
    }
}

/// Encodes, splits, fits and evaluates. CPU bound.
pub fn train(
    dataset: &Dataset,
    test_size: f64,
    params: ForestParams,
) -> Result<ModelArtifact, RiskError> {
    let frame = dataset.select(&Feature::ALL, TARGET_COLUMN)?;
    info!(rows = frame.len(), features = frame.columns.len(), "Selected features");

    let encoders = CategoryEncoders::fit(&frame);
    info!(
        mapping = ?encoders.mapping(Feature::CheckingStatus),
        "Checking status mapping"
    );
    let matrix = encoders.encode(&frame)?;

    let (train_idx, test_idx) =
        train_test_split(matrix.len(), test_size, params.seed).map_err(training_error)?;
    let pick = |indices: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
        indices
            .iter()
            .map(|&i| (matrix[i].clone(), frame.target[i]))
            .unzip()
    };
    let (x_train, y_train) = pick(&train_idx);
    let (x_test, y_test) = pick(&test_idx);

    info!(
        trees = params.n_estimators,
        max_depth = ?params.tree.max_depth,
        class_weight = ?params.class_weight,
        train_rows = x_train.len(),
        "Training random forest"
    );
    let started = Instant::now();
    let forest = RandomForest::fit(&x_train, &y_train, params).map_err(training_error)?;
    let accuracy = forest.score(&x_test, &y_test).map_err(training_error)?;
    info!(
        accuracy = %format!("{:.2}", accuracy),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Model evaluated"
    );

    let report = TrainingReport {
        train_rows: x_train.len(),
        test_rows: x_test.len(),
        accuracy,
        class_balance: class_counts(&y_train, forest.n_classes()),
    };
    Ok(ModelArtifact::new(encoders, forest, report))
}

/// Loads the dataset, trains off the async runtime, and saves the artifact.
pub async fn run(options: TrainingOptions) -> Result<ModelArtifact, RiskError> {
    let dataset = match &options.source {
        DatasetSource::File(path) => {
            let path = path.clone();
            tokio::task::spawn_blocking(move || Dataset::load(path))
                .await
                .map_err(training_error)??
        }
        DatasetSource::Remote { url, cache } => Dataset::fetch(url, cache.as_deref()).await?,
    };
    if dataset.is_empty() {
        warn!("Dataset has no rows");
        return Err(RiskError::InvalidDataset {
            reason: "dataset has no rows".to_string(),
        });
    }

    let test_size = options.test_size;
    let params = options.params.clone();
    let artifact = tokio::task::spawn_blocking(move || train(&dataset, test_size, params))
        .await
        .map_err(training_error)??;

    let fingerprint = artifact.save(&options.output)?;
    info!(
        path = %options.output.display(),
        fingerprint = %fingerprint,
        "Model saved"
    );
    Ok(artifact)
}
