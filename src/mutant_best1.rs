use ndarray::{Array1, Zip};
use rand::Rng;

use crate::bounded_round::bounded_round;
use crate::differential_evolution::Individual;
use crate::distinct_indices::distinct_index;

/// DE/best/1 mutant for slot `i`: the pool best plus one scaled difference
/// vector, rounded back onto each start-time window.
pub(crate) fn mutant_best1<R: Rng + ?Sized>(
    i: usize,
    pool: &[Individual],
    idx_best: usize,
    f: f64,
    upper: &Array1<i64>,
    rng: &mut R,
) -> Array1<i64> {
    let b = distinct_index(pool.len(), &[i, idx_best], rng);
    let c = distinct_index(pool.len(), &[i, idx_best, b], rng);

    Zip::from(&pool[idx_best].starts)
        .and(&pool[b].starts)
        .and(&pool[c].starts)
        .and(upper)
        .map_collect(|&xa, &xb, &xc, &hi| bounded_round(xa as f64 + f * (xb - xc) as f64, 1, hi))
}
