use rand::Rng;

/// Samples an index from non-negative `weights` using a random number generator.
///
/// Weights do not need to sum to one. An index with zero weight is never
/// chosen unless every weight is zero, in which case the choice is uniform.
///
/// # Parameters
/// - `weights`: A slice of non-negative weights, one per candidate.
/// - `rng`: The random number generator. Seed it for reproducible sampling.
///
/// # Returns
/// The index of the sampled candidate.
///
/// # Panics
/// Panics if `weights` is empty.
pub fn sample<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    assert!(!weights.is_empty(), "cannot sample from an empty distribution");

    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return rng.random_range(0..weights.len());
    }

    let mut random: f64 = rng.random::<f64>() * total;

    weights
        .iter()
        .position(|&x| {
            random -= x;
            x > 0.0 && random <= 0.
        })
        .unwrap_or_else(|| weights.iter().rposition(|&x| x > 0.0).unwrap_or(weights.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_zero_weight_never_sampled() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let index = sample(&[0.0, 1.0, 0.0, 2.0], &mut rng);
            assert!(index == 1 || index == 3);
        }
    }

    #[test]
    fn test_all_zero_is_uniform() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[sample(&[0.0, 0.0, 0.0], &mut rng)] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_single_weight() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(sample(&[0.4], &mut rng), 0);
    }
}
