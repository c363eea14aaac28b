//! Bounded, uniformly distributed perturbations for the sensor simulator.
//!
//! The simulator draws its noise through the [`NoiseSource`] trait so tests
//! can swap the entropy-backed [`UniformNoise`] for the deterministic
//! [`ZeroNoise`].

use rand::{rngs::StdRng, rngs::ThreadRng, Rng, SeedableRng};

/// A source of symmetric, bounded noise.
pub trait NoiseSource {
    /// Return a value uniformly distributed in `[-amplitude, amplitude]`.
    fn generate_noise(&mut self, amplitude: f32) -> f32;
}

/// Uniform noise drawn from a [`rand`] generator.
#[derive(Debug, Clone)]
pub struct UniformNoise<R = ThreadRng> {
    rng: R,
}

impl UniformNoise<ThreadRng> {
    /// Noise seeded from process entropy; values differ between runs.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl UniformNoise<StdRng> {
    /// Reproducible noise from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> UniformNoise<R> {
    /// Wrap an existing generator.
    #[must_use]
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> NoiseSource for UniformNoise<R> {
    #[inline]
    fn generate_noise(&mut self, amplitude: f32) -> f32 {
        amplitude * self.rng.gen_range(-1.0..=1.0_f32)
    }
}

/// A noise source that never perturbs anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    #[inline]
    fn generate_noise(&mut self, _amplitude: f32) -> f32 {
        0.0
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn generate_noise(&mut self, amplitude: f32) -> f32 {
        (**self).generate_noise(amplitude)
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for Box<N> {
    fn generate_noise(&mut self, amplitude: f32) -> f32 {
        (**self).generate_noise(amplitude)
    }
}

/// Draw one noise sample from the thread-local generator.
///
/// ```
/// let n = complementary_fusion::noise::generate_noise(2.0);
/// assert!((-2.0..=2.0).contains(&n));
/// ```
#[must_use]
pub fn generate_noise(amplitude: f32) -> f32 {
    UniformNoise::from_entropy().generate_noise(amplitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: usize = 10_000;

    #[allow(clippy::cast_precision_loss)]
    fn mean(samples: &[f32]) -> f32 {
        samples.iter().sum::<f32>() / samples.len() as f32
    }

    #[test]
    fn free_function_stays_within_amplitude() {
        let samples: Vec<f32> = (0..SAMPLES).map(|_| generate_noise(2.0)).collect();

        assert!(samples.iter().all(|n| (-2.0..=2.0).contains(n)));
        // uniform on [-2, 2] has a standard error of ~0.012 over 10k draws
        assert!(mean(&samples).abs() < 0.1);
    }

    #[test]
    fn uniform_noise_covers_both_signs() {
        let mut noise = UniformNoise::seeded(7);
        let samples: Vec<f32> = (0..SAMPLES).map(|_| noise.generate_noise(0.5)).collect();

        assert!(samples.iter().all(|n| (-0.5..=0.5).contains(n)));
        assert!(samples.iter().any(|n| *n > 0.25));
        assert!(samples.iter().any(|n| *n < -0.25));
        assert!(mean(&samples).abs() < 0.05);
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let mut a = UniformNoise::seeded(42);
        let mut b = UniformNoise::seeded(42);

        for _ in 0..32 {
            assert_eq!(a.generate_noise(1.0), b.generate_noise(1.0));
        }
    }

    #[test]
    fn zero_amplitude_yields_zero() {
        let mut noise = UniformNoise::from_entropy();
        for _ in 0..100 {
            assert_eq!(noise.generate_noise(0.0).abs(), 0.0);
        }
    }

    #[test]
    fn zero_noise_is_silent() {
        let mut noise = ZeroNoise;
        assert_eq!(noise.generate_noise(100.0), 0.0);
    }
}
