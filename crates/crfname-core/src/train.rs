//! Training-side collaborator interface: hyperparameters, the instance
//! bundle handed to a trainer, and the [`Trainer`] trait itself.

use serde::{Deserialize, Serialize};

use crate::dictionary::Dictionary;
use crate::error::{CrfNameError, Result};
use crate::parser::features::FeatureConfig;
use crate::parser::instance::Instance;

/// Hyperparameters for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// L2 regularization coefficient
    pub c2: f64,
    /// Upper bound on optimizer epochs
    pub max_iterations: usize,
    /// Stop once the relative objective improvement falls below this
    pub epsilon: f64,
    /// Log instance-building progress every this many sequences
    pub progress_interval: usize,
    /// Seed for the shuffle order
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            c2: 1.0,
            max_iterations: 100,
            epsilon: 0.0001,
            progress_interval: 500,
            seed: 0x5eed_c0de,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_c2(mut self, c2: f64) -> Self {
        self.c2 = c2;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject values no optimizer can work with.
    pub fn validate(&self) -> Result<()> {
        if !self.c2.is_finite() || self.c2 < 0.0 {
            return Err(CrfNameError::InvalidConfig(format!(
                "c2 must be a non-negative number, got {}",
                self.c2
            )));
        }
        if self.max_iterations == 0 {
            return Err(CrfNameError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(CrfNameError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.progress_interval == 0 {
            return Err(CrfNameError::InvalidConfig(
                "progress_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Everything a trainer needs: instances with gold label ids plus the
/// dictionaries and extraction settings the blob must carry.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    pub instances: Vec<Instance>,
    pub labels: Dictionary,
    pub attributes: Dictionary,
    pub feature_config: FeatureConfig,
}

impl TrainingData {
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// A sequence-model optimizer producing a serialized model blob.
pub trait Trainer {
    /// Fit parameters to `data`. Progress text goes to `log`.
    fn train(
        &self,
        data: &TrainingData,
        config: &TrainingConfig,
        log: &mut dyn FnMut(&str),
    ) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.c2, 1.0);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.epsilon, 0.0001);
        assert_eq!(config.progress_interval, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainingConfig::new().with_c2(-1.0),
            TrainingConfig::new().with_c2(f64::NAN),
            TrainingConfig::new().with_max_iterations(0),
            TrainingConfig::new().with_epsilon(0.0),
            TrainingConfig::new().with_progress_interval(0),
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(CrfNameError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_zero_c2_is_allowed() {
        assert!(TrainingConfig::new().with_c2(0.0).validate().is_ok());
    }
}
