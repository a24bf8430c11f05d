use std::f64::consts::PI;

use rand::Rng;
use rand::distributions::{Distribution, Standard};

/// Normal distribution sampled with the log/trigonometric Box-Muller formula.
///
/// Only the cosine branch is used, so every sample consumes two fresh uniform
/// draws and nothing is cached between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMuller {
    mean: f64,
    std_dev: f64,
}

impl BoxMuller {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }
}

impl Distribution<f64> for BoxMuller {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u = open_unit(rng);
        let v = open_unit(rng);
        let z = (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos();
        z * self.std_dev + self.mean
    }
}

pub fn normal_random<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    BoxMuller::new(mean, std_dev).sample(rng)
}

// [0,1) from `Standard`, redrawn until non-zero so ln(u) stays finite.
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = Standard.sample(rng);
        if u != 0.0 {
            return u;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::mock::StepRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_std_dev_returns_mean_exactly() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(normal_random(&mut rng, 1.0057, 0.0), 1.0057);
        }
    }

    #[test]
    fn zero_uniform_draws_are_skipped() {
        // Yields 0, then 2^63, 2^64 (wraps to 0), ... so the first draw of
        // each pair must be rejected.
        let mut rng = StepRng::new(0, 1 << 63);
        let sample = normal_random(&mut rng, 0.0, 1.0);
        assert!(sample.is_finite());
    }

    #[test]
    fn sample_moments_match_requested_distribution() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let dist = BoxMuller::new(2.0, 0.5);
        let n = 200_000;
        let draws: Vec<f64> = (0..n).map(|_| dist.sample(&mut rng)).collect();

        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);

        assert!((mean - 2.0).abs() < 0.01, "mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.01, "std dev {}", var.sqrt());
    }

    #[test]
    fn same_seed_reproduces_the_same_stream() {
        let mut a = ChaCha8Rng::seed_from_u64(9);
        let mut b = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..32 {
            assert_eq!(normal_random(&mut a, 0.0, 1.0), normal_random(&mut b, 0.0, 1.0));
        }
    }
}
