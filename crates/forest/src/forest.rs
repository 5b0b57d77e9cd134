use crate::{validate_training_set, DecisionTree, ForestError, MaxFeatures, TreeParams};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    Uniform,
    /// `n_samples / (n_classes * count(class))`, computed on the full training set.
    Balanced,
}

impl ClassWeight {
    pub fn weights(&self, y: &[usize], n_classes: usize) -> Vec<f64> {
        match self {
            ClassWeight::Uniform => vec![1.0; n_classes],
            ClassWeight::Balanced => {
                let counts = class_counts(y, n_classes);
                let present = counts.iter().filter(|&&c| c > 0).count().max(1);
                counts
                    .iter()
                    .map(|&count| {
                        if count == 0 {
                            0.0
                        } else {
                            y.len() as f64 / (present as f64 * count as f64)
                        }
                    })
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    pub class_weight: ClassWeight,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            tree: TreeParams {
                max_depth: Some(15),
                min_samples_split: 2,
                min_samples_leaf: 1,
                max_features: MaxFeatures::Sqrt,
            },
            class_weight: ClassWeight::Balanced,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.n_estimators == 0 {
            return Err(ForestError::InvalidParams {
                reason: "n_estimators must be >= 1".to_string(),
            });
        }
        self.tree.validate()
    }
}

/// Bagged ensemble of [`DecisionTree`]s. Probabilities are the mean of the
/// per-tree leaf distributions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[usize], params: ForestParams) -> Result<Self, ForestError> {
        params.validate()?;
        let n_features = validate_training_set(x, y)?;
        let n_classes = y.iter().copied().max().map_or(0, |max| max + 1);
        if class_counts(y, n_classes).iter().filter(|&&c| c > 0).count() < 2 {
            return Err(ForestError::SingleClass);
        }

        let class_weights = params.class_weight.weights(y, n_classes);
        let n_samples = x.len();
        let mut seeder = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for index in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(seeder.gen());

            let mut weights = vec![0.0; n_samples];
            if params.bootstrap {
                for _ in 0..n_samples {
                    weights[rng.gen_range(0..n_samples)] += 1.0;
                }
            } else {
                weights.iter_mut().for_each(|w| *w = 1.0);
            }
            for (weight, &label) in weights.iter_mut().zip(y) {
                *weight *= class_weights[label];
            }

            let tree = DecisionTree::fit(x, y, &weights, n_classes, &params.tree, &mut rng)?;
            debug!(
                tree = index,
                depth = tree.depth(),
                leaves = tree.n_leaves(),
                "Fitted tree"
            );
            trees.push(tree);
        }

        Ok(Self {
            params,
            n_features,
            n_classes,
            trees,
        })
    }

    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ForestError> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.predict_proba(row)?) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        sum.iter_mut().for_each(|p| *p /= n);
        Ok(sum)
    }

    /// Most probable class; ties resolve to the lower class index.
    pub fn predict(&self, row: &[f64]) -> Result<usize, ForestError> {
        let proba = self.predict_proba(row)?;
        let mut best = 0;
        for (class, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = class;
            }
        }
        Ok(best)
    }

    /// Accuracy on the given rows.
    pub fn score(&self, x: &[Vec<f64>], y: &[usize]) -> Result<f64, ForestError> {
        if x.len() != y.len() {
            return Err(ForestError::LabelMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        let predictions = x
            .iter()
            .map(|row| self.predict(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(crate::accuracy(y, &predictions))
    }

    /// Checks a deserialized forest before it is used for scoring.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.trees.is_empty() {
            return Err(ForestError::MalformedTree {
                reason: "forest has no trees".to_string(),
            });
        }
        for (index, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || tree.n_classes() != self.n_classes {
                return Err(ForestError::MalformedTree {
                    reason: format!(
                        "tree {} is shaped {}x{}, forest is {}x{}",
                        index,
                        tree.n_features(),
                        tree.n_classes(),
                        self.n_features,
                        self.n_classes
                    ),
                });
            }
            tree.validate().map_err(|e| ForestError::MalformedTree {
                reason: format!("tree {}: {}", index, e),
            })?;
        }
        Ok(())
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

pub fn class_counts(y: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    counts
}
