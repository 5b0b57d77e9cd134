use crate::ForestError;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffles `0..n` and returns `(train, test)` index sets; the test set
/// holds `ceil(n * test_size)` rows.
pub fn train_test_split(
    n: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), ForestError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ForestError::InvalidParams {
            reason: format!("test_size must be in (0, 1), got {}", test_size),
        });
    }
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ForestError::InvalidParams {
            reason: format!("cannot split {} rows with test_size {}", n, test_size),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Fraction of positions where `predicted` equals `truth`.
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}
