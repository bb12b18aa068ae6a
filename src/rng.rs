// src/rng.rs
//! Random Number Generation for Monte Carlo Simulations
//!
//! # Design Philosophy
//!
//! Path sampling needs normals that are:
//! 1. **Reproducible**: Same seed pair → same paths
//! 2. **Independent of scheduling**: Sequential and parallel runs see the same draws
//! 3. **Variance reduced** on request: antithetic pairs `(z, -z)`
//!
//! # Counter-Based (Stateless) Draws
//!
//! A stateless draw is a pure function of `(seed pair, sample, step, component)`:
//! ```text
//! key     = mix(seed₀ ⊕ mix(seed₁))
//! counter = mix(mix(mix(key ⊕ sample) ⊕ step) ⊕ component)
//! z       = BoxMuller(CounterRng(key, counter))
//! ```
//! No generator state is carried between draws, so any sample can be drawn on
//! any thread in any order.
//!
//! # Box-Muller Transform
//!
//! ```text
//! Z₁ = √(-2ln(U₁)) * cos(2πU₂)
//! Z₂ = √(-2ln(U₁)) * sin(2πU₂)
//! ```
//! where U₁ ∈ (0,1], U₂ ∈ [0,1).

use crate::error::{SdeError, SdeResult};
use crate::mc::config::ExecutionMode;
use ndarray::{s, Array2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Source of the normal draws driving the Brownian increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomType {
    /// Seeded `StdRng`, drawn step by step
    Pseudo,
    /// `Pseudo` for the first half of the samples, negated for the second half
    PseudoAntithetic,
    /// Counter-based draws keyed by the seed pair
    Stateless,
    /// `Stateless` for the first half of the samples, negated for the second half
    #[default]
    StatelessAntithetic,
}

impl RandomType {
    pub fn is_antithetic(&self) -> bool {
        matches!(self, RandomType::PseudoAntithetic | RandomType::StatelessAntithetic)
    }

    pub fn is_stateless(&self) -> bool {
        matches!(self, RandomType::Stateless | RandomType::StatelessAntithetic)
    }
}

/// splitmix64 finaliser
#[inline]
fn mix(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// Counter-based RNG
///
/// Uses splitmix64-like algorithm:
/// ```text
/// z = base_seed + counter
/// z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
/// z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
/// output = z ⊕ (z >> 31)
/// ```
#[derive(Debug, Clone)]
pub struct CounterRng {
    base_seed: u64,
    counter: u64,
}

impl CounterRng {
    pub fn new(base_seed: u64, counter: u64) -> Self {
        Self { base_seed, counter }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        let mut z = self.base_seed.wrapping_add(self.counter);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
        z ^ (z >> 31)
    }

    /// Uniform on [0, 1)
    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / 9007199254740992.0) // 2^53
    }

    /// Uniform on (0, 1]
    pub fn uniform_open(&mut self) -> f64 {
        ((self.next_u64() >> 11) + 1) as f64 * (1.0 / 9007199254740992.0)
    }

    /// Pair of independent standard normals
    pub fn normal_pair(&mut self) -> (f64, f64) {
        let u1 = self.uniform_open();
        let u2 = self.uniform();

        let mag = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        (mag * angle.cos(), mag * angle.sin())
    }

    pub fn normal(&mut self) -> f64 {
        self.normal_pair().0
    }
}

/// Standard normal draw for `(sample, step, component)` under `seed`
pub fn stateless_normal(seed: [u64; 2], sample: u64, step: u64, component: u64) -> f64 {
    let key = mix(seed[0] ^ mix(seed[1]));
    let counter = mix(mix(mix(key ^ sample) ^ step) ^ component);
    CounterRng::new(key, counter).normal()
}

pub fn seed_rng_from_u64(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// Per-step generator of `[num_samples, dim]` normal matrices
#[derive(Debug)]
pub struct NormalSampler {
    random_type: RandomType,
    seed: [u64; 2],
    num_samples: usize,
    dim: usize,
    execution: ExecutionMode,
    rng: Option<StdRng>,
}

impl NormalSampler {
    pub fn new(
        random_type: RandomType,
        seed: Option<[u64; 2]>,
        num_samples: usize,
        dim: usize,
        execution: ExecutionMode,
    ) -> SdeResult<Self> {
        if random_type.is_antithetic() && num_samples % 2 != 0 {
            return Err(SdeError::InvalidConfiguration {
                field: "num_samples".to_string(),
                reason: format!("antithetic sampling needs an even count, got {}", num_samples),
            });
        }

        let (seed, rng) = match (random_type.is_stateless(), seed) {
            (true, Some(seed)) => (seed, None),
            (true, None) => {
                return Err(SdeError::InvalidConfiguration {
                    field: "seed".to_string(),
                    reason: format!("{:?} sampling requires a seed pair", random_type),
                })
            }
            (false, Some(seed)) => (seed, Some(seed_rng_from_u64(mix(seed[0] ^ mix(seed[1]))))),
            (false, None) => ([0, 0], Some(StdRng::from_entropy())),
        };

        Ok(NormalSampler {
            random_type,
            seed,
            num_samples,
            dim,
            execution,
            rng,
        })
    }

    pub fn random_type(&self) -> RandomType {
        self.random_type
    }

    /// Draws for time step `step`; rows are samples, columns are components
    pub fn draws(&mut self, step: usize) -> Array2<f64> {
        let base_rows = if self.random_type.is_antithetic() {
            self.num_samples / 2
        } else {
            self.num_samples
        };

        let mut base = Array2::zeros((base_rows, self.dim));
        match self.rng.as_mut() {
            Some(rng) => base.iter_mut().for_each(|z| *z = get_normal_draw(rng)),
            None => {
                let seed = self.seed;
                let step = step as u64;
                let fill = |(i, d): (usize, usize), z: &mut f64| {
                    *z = stateless_normal(seed, i as u64, step, d as u64)
                };
                match self.execution {
                    ExecutionMode::Sequential => Zip::indexed(&mut base).for_each(fill),
                    ExecutionMode::Parallel => Zip::indexed(&mut base).par_for_each(fill),
                }
            }
        }

        if !self.random_type.is_antithetic() {
            return base;
        }
        let mut out = Array2::zeros((self.num_samples, self.dim));
        out.slice_mut(s![..base_rows, ..]).assign(&base);
        out.slice_mut(s![base_rows.., ..]).assign(&base.mapv(|z| -z));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_rng_reproducibility() {
        let mut rng1 = CounterRng::new(42, 0);
        let mut rng2 = CounterRng::new(42, 0);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_stateless_normal_is_pure() {
        let a = stateless_normal([1, 2], 17, 3, 0);
        let b = stateless_normal([1, 2], 17, 3, 0);
        assert_eq!(a, b);
        assert_ne!(a, stateless_normal([1, 2], 17, 3, 1));
        assert_ne!(a, stateless_normal([1, 2], 17, 4, 0));
        assert_ne!(a, stateless_normal([2, 1], 17, 3, 0));
    }

    #[test]
    fn test_stateless_normal_distribution() {
        let samples: Vec<f64> = (0..20_000)
            .map(|i| stateless_normal([7, 11], i, 0, 0))
            .collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.05, "Mean should be close to 0, got {}", mean);
        assert!((variance - 1.0).abs() < 0.05, "Variance should be close to 1, got {}", variance);
    }

    #[test]
    fn test_antithetic_halves_are_negated() {
        let mut sampler = NormalSampler::new(
            RandomType::StatelessAntithetic,
            Some([1, 2]),
            10,
            3,
            ExecutionMode::Sequential,
        )
        .unwrap();
        let z = sampler.draws(0);
        assert_eq!(z.dim(), (10, 3));
        for i in 0..5 {
            for d in 0..3 {
                assert_eq!(z[[i, d]], -z[[i + 5, d]]);
            }
        }
    }

    #[test]
    fn test_pseudo_antithetic_halves_are_negated() {
        let mut sampler = NormalSampler::new(
            RandomType::PseudoAntithetic,
            Some([3, 4]),
            6,
            2,
            ExecutionMode::Sequential,
        )
        .unwrap();
        let z = sampler.draws(0);
        for i in 0..3 {
            assert_eq!(z.row(i), z.row(i + 3).mapv(|v| -v));
        }
    }

    #[test]
    fn test_stateless_draws_ignore_execution_mode() {
        let mut seq = NormalSampler::new(
            RandomType::Stateless,
            Some([5, 6]),
            64,
            2,
            ExecutionMode::Sequential,
        )
        .unwrap();
        let mut par = NormalSampler::new(
            RandomType::Stateless,
            Some([5, 6]),
            64,
            2,
            ExecutionMode::Parallel,
        )
        .unwrap();
        for step in 0..4 {
            assert_eq!(seq.draws(step), par.draws(step));
        }
    }

    #[test]
    fn test_pseudo_seeded_is_reproducible() {
        let mut a = NormalSampler::new(
            RandomType::Pseudo,
            Some([9, 9]),
            8,
            1,
            ExecutionMode::Sequential,
        )
        .unwrap();
        let mut b = NormalSampler::new(
            RandomType::Pseudo,
            Some([9, 9]),
            8,
            1,
            ExecutionMode::Parallel,
        )
        .unwrap();
        assert_eq!(a.draws(0), b.draws(0));
        assert_eq!(a.draws(1), b.draws(1));
    }

    #[test]
    fn test_invalid_sampler_configuration() {
        assert!(NormalSampler::new(
            RandomType::StatelessAntithetic,
            Some([1, 2]),
            11,
            1,
            ExecutionMode::Sequential
        )
        .is_err());
        assert!(NormalSampler::new(
            RandomType::Stateless,
            None,
            10,
            1,
            ExecutionMode::Sequential
        )
        .is_err());
    }
}
