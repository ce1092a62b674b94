use ndarray::Array1;
use rand::Rng;

/// Draws `pool_size` start vectors, each component uniform on `[1, tmax_j]`.
pub(crate) fn init_random<R: Rng + ?Sized>(
    pool_size: usize,
    upper: &Array1<i64>,
    rng: &mut R,
) -> Vec<Array1<i64>> {
    (0..pool_size)
        .map(|_| upper.map(|&hi| rng.random_range(1..=hi)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_starts_stay_in_window() {
        let upper = array![1i64, 4, 13];
        let mut rng = StdRng::seed_from_u64(3);
        for starts in init_random(50, &upper, &mut rng) {
            for (j, &start) in starts.iter().enumerate() {
                assert!(start >= 1 && start <= upper[j]);
            }
        }
    }

    #[test]
    fn test_single_start_window_is_forced() {
        let upper = array![1i64, 1];
        let mut rng = StdRng::seed_from_u64(4);
        for starts in init_random(10, &upper, &mut rng) {
            assert_eq!(starts, array![1i64, 1]);
        }
    }
}
