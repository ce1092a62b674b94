use ndarray::{Array1, Zip};
use rand::Rng;

use crate::bounded_round::bounded_round;
use crate::differential_evolution::Individual;
use crate::distinct_indices::distinct_index;

/// DE/rand/1 mutant for slot `i`: a uniformly chosen base plus one scaled
/// difference vector, rounded back onto each start-time window.
pub(crate) fn mutant_rand1<R: Rng + ?Sized>(
    i: usize,
    pool: &[Individual],
    f: f64,
    upper: &Array1<i64>,
    rng: &mut R,
) -> Array1<i64> {
    let a = rng.random_range(0..pool.len());
    let b = distinct_index(pool.len(), &[i, a], rng);
    let c = distinct_index(pool.len(), &[i, a, b], rng);

    Zip::from(&pool[a].starts)
        .and(&pool[b].starts)
        .and(&pool[c].starts)
        .and(upper)
        .map_collect(|&xa, &xb, &xc, &hi| bounded_round(xa as f64 + f * (xb - xc) as f64, 1, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::Fitness;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_mutant_stays_in_window() {
        let pool: Vec<Individual> = (0..6)
            .map(|k| Individual {
                starts: array![1 + k as i64, 12 - 2 * k as i64],
                fitness: Fitness {
                    violations: 0,
                    magnitude: 0.0,
                    objective: 0.0,
                },
            })
            .collect();
        let upper = array![6i64, 12];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mutant = mutant_rand1(3, &pool, 0.9, &upper, &mut rng);
            for (j, &value) in mutant.iter().enumerate() {
                assert!(value >= 1 && value <= upper[j]);
            }
        }
    }
}
