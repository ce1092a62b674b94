use ndarray::Array1;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Weights of the segment-length distribution: `P(L = l) = rho^(l-1) - rho^l`
/// for `l = 1..n`.
pub(crate) fn segment_length_weights(rho: f64, n: usize) -> Vec<f64> {
    (1..=n)
        .map(|l| rho.powi(l as i32 - 1) - rho.powi(l as i32))
        .collect()
}

/// Exponential crossover: copies the mutant over one circular segment
/// `[k1, k1 + L] mod n` and keeps the parent elsewhere. `lengths` samples
/// `L - 1` from [`segment_length_weights`].
pub(crate) fn exponential_crossover<R: Rng + ?Sized>(
    parent: &Array1<i64>,
    mutant: &Array1<i64>,
    lengths: &WeightedIndex<f64>,
    rng: &mut R,
) -> Array1<i64> {
    let n = parent.len();
    let k1 = rng.random_range(0..n);
    let k2 = k1 + lengths.sample(rng) + 1;

    let mut trial = parent.clone();
    for j in 0..n {
        let inside = if k2 < n {
            j >= k1 && j <= k2
        } else {
            j >= k1 || j <= k2 % n
        };
        if inside {
            trial[j] = mutant[j];
        }
    }
    trial
}
