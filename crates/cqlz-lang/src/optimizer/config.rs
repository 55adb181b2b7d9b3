use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, OptimizerError};

/// Settings of one optimization run, usually read from a TOML file.
///
/// ```toml
/// population_size = 500
/// generations = 40
/// workers = 4
/// seed = 7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Number of threads evaluating fitness.
    pub workers: usize,
    pub mutation_probability: f64,
    /// Mutation probability is halved in generations after this one. `0` disables it.
    pub tune_after: usize,
    /// Upper bound of freshly drawn genes.
    pub max_gene_value: f64,
    /// Share of the sorted population parents are drawn from.
    pub parent_fraction: f64,
    /// Seconds above which a query counts as slow.
    pub threshold: f64,
    pub f_beta: f64,
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            generations: 30,
            workers: 8,
            mutation_probability: 0.15,
            tune_after: 29,
            max_gene_value: 100.0,
            parent_fraction: 0.2,
            threshold: 1.0,
            f_beta: 0.5,
            seed: None,
        }
    }
}

impl OptimizerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), OptimizerError> {
        let invalid = |message: &str| Err(OptimizerError::InvalidConfig(message.to_string()));

        if self.population_size == 0 {
            return invalid("population_size must be at least 1");
        }
        if self.generations == 0 {
            return invalid("generations must be at least 1");
        }
        if self.workers == 0 {
            return invalid("workers must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return invalid("mutation_probability must be within [0, 1]");
        }
        if !(self.max_gene_value.is_finite() && self.max_gene_value > 0.0) {
            return invalid("max_gene_value must be a positive number");
        }
        if !(self.parent_fraction > 0.0 && self.parent_fraction <= 1.0) {
            return invalid("parent_fraction must be within (0, 1]");
        }
        if !self.threshold.is_finite() {
            return invalid("threshold must be a finite number");
        }
        if !(self.f_beta.is_finite() && self.f_beta > 0.0) {
            return invalid("f_beta must be a positive number");
        }

        Ok(())
    }

    /// Number of top individuals parents are drawn from, at least one.
    pub fn parent_pool_size(&self) -> usize {
        let size = (self.population_size as f64 * self.parent_fraction) as usize;
        size.clamp(1, self.population_size.max(1))
    }

    pub fn mutation_probability_at(&self, generation: usize) -> f64 {
        if self.tune_after > 0 && generation > self.tune_after {
            self.mutation_probability / 2.0
        } else {
            self.mutation_probability
        }
    }
}
