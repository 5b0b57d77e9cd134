use crate::{validate_training_set, ForestError};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Number of candidate features examined per split.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Count(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeParams {
    /// `None` grows until every leaf is pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.min_samples_split < 2 {
            return Err(ForestError::InvalidParams {
                reason: format!("min_samples_split must be >= 2, got {}", self.min_samples_split),
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(ForestError::InvalidParams {
                reason: "min_samples_leaf must be >= 1".to_string(),
            });
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(ForestError::InvalidParams {
                reason: "max_features must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        proba: Vec<f64>,
    },
    /// Rows with `x[feature] <= threshold` go to `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Binary CART classifier using weighted Gini impurity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    n_features: usize,
    n_classes: usize,
    nodes: Vec<Node>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Task {
    samples: Vec<usize>,
    depth: usize,
    slot: usize,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    params: &'a TreeParams,
}

impl DecisionTree {
    /// Fits a tree on the rows with a positive `sample_weight`.
    /// Bootstrap multiplicities and class weights are both expressed as weights.
    pub fn fit<R: Rng + ?Sized>(
        x: &[Vec<f64>],
        y: &[usize],
        sample_weight: &[f64],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self, ForestError> {
        params.validate()?;
        let n_features = validate_training_set(x, y)?;
        if sample_weight.len() != x.len() {
            return Err(ForestError::InvalidParams {
                reason: format!(
                    "sample_weight has {} entries for {} rows",
                    sample_weight.len(),
                    x.len()
                ),
            });
        }
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(ForestError::LabelOutOfRange { label, n_classes });
        }

        let samples: Vec<usize> = (0..x.len()).filter(|&i| sample_weight[i] > 0.0).collect();
        if samples.is_empty() {
            return Err(ForestError::EmptyDataset);
        }

        let builder = Builder {
            x,
            y,
            weights: sample_weight,
            n_classes,
            n_features,
            max_features: params.max_features.resolve(n_features),
            params,
        };

        let mut nodes = vec![Node::Leaf { proba: Vec::new() }];
        let mut stack = vec![Task {
            samples,
            depth: 0,
            slot: 0,
        }];

        while let Some(task) = stack.pop() {
            let dist = builder.distribution(&task.samples);
            let split = if builder.should_stop(&task, &dist) {
                None
            } else {
                builder.best_split(&task.samples, &dist, rng)
            };

            match split {
                None => nodes[task.slot] = Node::Leaf { proba: normalize(dist) },
                Some(candidate) => {
                    let (left, right): (Vec<usize>, Vec<usize>) = task
                        .samples
                        .iter()
                        .partition(|&&i| x[i][candidate.feature] <= candidate.threshold);

                    let left_slot = nodes.len();
                    let right_slot = left_slot + 1;
                    nodes.push(Node::Leaf { proba: Vec::new() });
                    nodes.push(Node::Leaf { proba: Vec::new() });
                    nodes[task.slot] = Node::Split {
                        feature: candidate.feature,
                        threshold: candidate.threshold,
                        left: left_slot,
                        right: right_slot,
                    };

                    stack.push(Task {
                        samples: right,
                        depth: task.depth + 1,
                        slot: right_slot,
                    });
                    stack.push(Task {
                        samples: left,
                        depth: task.depth + 1,
                        slot: left_slot,
                    });
                }
            }
        }

        Ok(Self {
            n_features,
            n_classes,
            nodes,
        })
    }

    pub fn predict_proba(&self, row: &[f64]) -> Result<&[f64], ForestError> {
        if row.len() != self.n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }

        let mut index = 0;
        loop {
            let Some(node) = self.nodes.get(index) else {
                return Err(malformed(format!(
                    "node {} is out of range for {} nodes",
                    index,
                    self.nodes.len()
                )));
            };
            match node {
                Node::Leaf { proba } => return Ok(proba),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row
                        .get(*feature)
                        .ok_or_else(|| malformed(format!("feature {} does not exist", feature)))?;
                    let next = if *value <= *threshold { *left } else { *right };
                    // Children always come after their parent, so descent terminates.
                    if next <= index {
                        return Err(malformed(format!(
                            "node {} points back to node {}",
                            index, next
                        )));
                    }
                    index = next;
                }
            }
        }
    }

    /// Structural checks for a tree read from disk: a root exists, every
    /// child index lies after its parent and inside the node list, split
    /// features exist, and every leaf carries one probability per class.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.nodes.is_empty() {
            return Err(malformed("tree has no nodes".to_string()));
        }
        let n_nodes = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { proba } => {
                    if proba.len() != self.n_classes {
                        return Err(malformed(format!(
                            "leaf {} has {} probabilities for {} classes",
                            index,
                            proba.len(),
                            self.n_classes
                        )));
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(malformed(format!(
                            "split {} uses feature {} of {}",
                            index, feature, self.n_features
                        )));
                    }
                    for &child in [left, right] {
                        if child <= index || child >= n_nodes {
                            return Err(malformed(format!(
                                "split {} has child {} outside {}..{}",
                                index,
                                child,
                                index + 1,
                                n_nodes
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(Node::Split { left, right, .. }) = self.nodes.get(index) {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

impl Builder<'_> {
    fn distribution(&self, samples: &[usize]) -> Vec<f64> {
        let mut dist = vec![0.0; self.n_classes];
        for &i in samples {
            dist[self.y[i]] += self.weights[i];
        }
        dist
    }

    fn should_stop(&self, task: &Task, dist: &[f64]) -> bool {
        let classes_present = dist.iter().filter(|&&w| w > 0.0).count();
        let n = task.samples.len();
        classes_present <= 1
            || self.params.max_depth.is_some_and(|max| task.depth >= max)
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
    }

    fn best_split<R: Rng + ?Sized>(
        &self,
        samples: &[usize],
        parent: &[f64],
        rng: &mut R,
    ) -> Option<Candidate> {
        let total: f64 = parent.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let parent_impurity = gini(parent.iter().copied(), total);
        let min_leaf = self.params.min_samples_leaf;

        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let mut order = samples.to_vec();
        let mut left = vec![0.0; self.n_classes];
        let mut best: Option<Candidate> = None;
        let mut visited = 0;

        for feature in features {
            if visited >= self.max_features {
                break;
            }

            let x = self.x;
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
            let first = x[order[0]][feature];
            let last = x[order[order.len() - 1]][feature];
            // Constant features do not count against max_features.
            if first == last {
                continue;
            }
            visited += 1;

            left.iter_mut().for_each(|w| *w = 0.0);
            let mut left_weight = 0.0;

            for pos in 0..order.len() - 1 {
                let i = order[pos];
                left[self.y[i]] += self.weights[i];
                left_weight += self.weights[i];

                let value = x[i][feature];
                let next = x[order[pos + 1]][feature];
                if value == next {
                    continue;
                }
                let n_left = pos + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }

                let right_weight = total - left_weight;
                if right_weight <= 0.0 || left_weight <= 0.0 {
                    continue;
                }
                let left_impurity = gini(left.iter().copied(), left_weight);
                let right_impurity = gini(
                    parent.iter().zip(&left).map(|(p, l)| p - l),
                    right_weight,
                );
                let children =
                    (left_weight * left_impurity + right_weight * right_impurity) / total;
                let gain = parent_impurity - children;

                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Candidate {
                        feature,
                        threshold: midpoint(value, next),
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn gini(dist: impl Iterator<Item = f64>, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - dist.map(|w| (w / total).powi(2)).sum::<f64>()
}

fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid >= high || !mid.is_finite() {
        low
    } else {
        mid
    }
}

fn malformed(reason: String) -> ForestError {
    ForestError::MalformedTree { reason }
}

fn normalize(mut dist: Vec<f64>) -> Vec<f64> {
    let total: f64 = dist.iter().sum();
    if total > 0.0 {
        dist.iter_mut().for_each(|w| *w /= total);
    } else {
        let uniform = 1.0 / dist.len().max(1) as f64;
        dist.iter_mut().for_each(|w| *w = uniform);
    }
    dist
}
