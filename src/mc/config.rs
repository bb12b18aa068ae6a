// src/mc/config.rs
use crate::error::{validation::*, SdeError, SdeResult};
use crate::rng::RandomType;

/// How per-sample work is scheduled
///
/// Both modes produce bitwise-identical paths for a fixed seed: every sample
/// performs the same floating-point operations in the same order, and no
/// step depends on values from other samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    Sequential,
    #[default]
    Parallel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Times at which prices are recorded, strictly increasing and positive
    pub times: Vec<f64>,
    pub num_samples: usize,
    /// Uniform steps over `[0, max(times)]`, merged with `times`
    pub num_time_steps: usize,
    pub random_type: RandomType,
    pub seed: Option<[u64; 2]>,
    pub execution: ExecutionMode,
}

impl SamplingConfig {
    /// Validate the sampling configuration
    pub fn validate(&self) -> SdeResult<()> {
        validate_paths(self.num_samples)?;
        validate_steps(self.num_time_steps)?;

        if self.times.is_empty() {
            return Err(SdeError::InvalidConfiguration {
                field: "times".to_string(),
                reason: "need at least one sampling time".to_string(),
            });
        }
        validate_strictly_increasing("times", &self.times)?;
        validate_positive("times[0]", self.times[0])?;

        if self.random_type.is_antithetic() && self.num_samples % 2 != 0 {
            return Err(SdeError::InvalidConfiguration {
                field: "num_samples".to_string(),
                reason: format!(
                    "antithetic sampling needs an even count, got {}",
                    self.num_samples
                ),
            });
        }
        if self.random_type.is_stateless() && self.seed.is_none() {
            return Err(SdeError::InvalidConfiguration {
                field: "seed".to_string(),
                reason: format!("{:?} sampling requires a seed pair", self.random_type),
            });
        }

        Ok(())
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            times: vec![1.0, 2.0],
            num_samples: 10_000,
            num_time_steps: 20,
            random_type: RandomType::StatelessAntithetic,
            seed: Some([1, 2]),
            execution: ExecutionMode::Parallel,
        }
    }
}
