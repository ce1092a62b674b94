use rand::Rng;

/// Draws a pool index outside `exclude` by resampling until distinct.
pub(crate) fn distinct_index<R: Rng + ?Sized>(
    pool_size: usize,
    exclude: &[usize],
    rng: &mut R,
) -> usize {
    debug_assert!(exclude.len() < pool_size);
    loop {
        let idx = rng.random_range(0..pool_size);
        if !exclude.contains(&idx) {
            return idx;
        }
    }
}
