//! Genetic search for weight vectors.
//!
//! Each generation every individual is scored against the [`Dataset`] on a
//! fixed pool of worker threads, the population is sorted by mean absolute
//! error and the next generation is bred from the best fifth. The best
//! individual ever seen is kept across generations.

pub mod chromosome;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fitness;
pub mod population;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compiler::Weights;
use crate::vm::Vm;

pub use chromosome::Chromosome;
pub use config::OptimizerConfig;
pub use dataset::{Dataset, Sample};
pub use error::{ConfigError, OptimizerError};
pub use fitness::{EvalStats, evaluate};
pub use population::{Individual, Population};

/// Shared flag asking a running optimization to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub best: f64,
    pub worst: f64,
    pub best_so_far: f64,
    /// F-beta of the best individual of this generation.
    pub f_beta: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizerResult {
    pub weights: Weights,
    pub stats: EvalStats,
    /// F-beta of `stats` with the configured beta.
    pub f_beta: f64,
    /// One report per finished generation.
    pub history: Vec<GenerationReport>,
}

pub struct Optimizer {
    config: OptimizerConfig,
    pool: rayon::ThreadPool,
    rng: ChaCha8Rng,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self, OptimizerError> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("cqlz-fitness-{i}"))
            .build()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self { config, pool, rng })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn run(
        &mut self,
        dataset: &Dataset,
        cancel: &CancelToken,
    ) -> Result<OptimizerResult, OptimizerError> {
        self.run_with(dataset, cancel, |_| {})
    }

    /// Like [`Optimizer::run`], calling `on_generation` after every generation.
    pub fn run_with<F>(
        &mut self,
        dataset: &Dataset,
        cancel: &CancelToken,
        mut on_generation: F,
    ) -> Result<OptimizerResult, OptimizerError>
    where
        F: FnMut(&GenerationReport),
    {
        if dataset.is_empty() {
            return Err(OptimizerError::EmptyDataset);
        }

        info!(
            samples = dataset.len(),
            population = self.config.population_size,
            generations = self.config.generations,
            workers = self.config.workers,
            "Starting optimization"
        );

        let mut population = Population::random(&self.config, Weights::DIMENSION, &mut self.rng);
        let mut best: Option<Individual> = None;
        let mut history = Vec::with_capacity(self.config.generations);

        for generation in 0..self.config.generations {
            self.evaluate(&mut population, dataset, cancel)?;
            population.sort();

            let (Some(leader), Some(last)) = (population.best(), population.worst()) else {
                return Err(OptimizerError::InvalidConfig(
                    "population_size must be at least 1".to_string(),
                ));
            };
            if best
                .as_ref()
                .is_none_or(|best| leader.fitness() < best.fitness())
            {
                best = Some(leader.clone());
            }

            let report = GenerationReport {
                generation,
                best: leader.fitness(),
                worst: last.fitness(),
                best_so_far: best.as_ref().map_or(f64::INFINITY, Individual::fitness),
                f_beta: leader
                    .stats
                    .as_ref()
                    .map_or(0.0, |stats| stats.f_beta(self.config.f_beta)),
            };
            info!(
                generation,
                best = report.best,
                worst = report.worst,
                best_so_far = report.best_so_far,
                f_beta = report.f_beta,
                "Generation finished"
            );
            if let Some(best) = &best {
                debug!(chromosome = %best.chromosome, "Best chromosome");
            }
            on_generation(&report);
            history.push(report);

            if generation + 1 < self.config.generations {
                population = population.breed(&self.config, generation, &mut self.rng);
            }
        }

        let best = best.ok_or_else(|| {
            OptimizerError::InvalidConfig("generations must be at least 1".to_string())
        })?;
        let stats = best.stats.unwrap_or_default();
        let f_beta = stats.f_beta(self.config.f_beta);
        info!(%stats, beta = self.config.f_beta, f_beta, "Optimization finished");

        Ok(OptimizerResult {
            weights: best.chromosome.to_weights()?,
            stats,
            f_beta,
            history,
        })
    }

    /// Scores all individuals, one contiguous chunk per worker.
    fn evaluate(
        &self,
        population: &mut Population,
        dataset: &Dataset,
        cancel: &CancelToken,
    ) -> Result<(), OptimizerError> {
        let threshold = self.config.threshold;
        let chunks = population::split_chunks(population.as_mut_slice(), self.config.workers);

        // the scope returns once every chunk is done
        self.pool.scope(|scope| {
            for chunk in chunks {
                scope.spawn(move |_| {
                    let mut vm = Vm::new();

                    for individual in chunk.iter_mut() {
                        if cancel.is_cancelled() {
                            return;
                        }

                        individual.stats = match individual.chromosome.to_weights() {
                            Ok(weights) => Some(evaluate(dataset, &weights, threshold, &mut vm)),
                            Err(err) => {
                                warn!(error = %err, "Skipping malformed chromosome");
                                None
                            }
                        };
                    }
                });
            }
        });

        if cancel.is_cancelled() {
            return Err(OptimizerError::Cancelled);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_pairs([
            (r#"[word=".*"]"#, 40.0),
            (r#"[word="a.*"]"#, 20.0),
            (r#"[lemma="house"]"#, 0.2),
            (r#"[tag="N.*"] []{1,3} [word="x"]"#, 5.0),
            (r#""the" within <s/>"#, 0.5),
        ])
    }

    fn config() -> OptimizerConfig {
        OptimizerConfig {
            population_size: 40,
            generations: 6,
            workers: 3,
            seed: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_best_so_far_never_increases() {
        let result = Optimizer::new(config())
            .unwrap()
            .run(&dataset(), &CancelToken::new())
            .unwrap();

        assert_eq!(result.history.len(), 6);
        assert!(
            result
                .history
                .windows(2)
                .all(|w| w[1].best_so_far <= w[0].best_so_far)
        );
        assert_eq!(result.stats.total, 5);
        assert_eq!(
            result.stats.fitness(),
            result.history.last().unwrap().best_so_far
        );
    }

    #[test]
    fn test_reports_configured_f_beta() {
        let config = OptimizerConfig {
            f_beta: 2.0,
            ..config()
        };
        let result = Optimizer::new(config.clone())
            .unwrap()
            .run(&dataset(), &CancelToken::new())
            .unwrap();

        assert_eq!(result.f_beta, result.stats.f_beta(config.f_beta));
        assert!((0.0..=1.0).contains(&result.f_beta));
        assert!(
            result
                .history
                .iter()
                .all(|report| (0.0..=1.0).contains(&report.f_beta))
        );
    }

    #[test]
    fn test_seed_is_reproducible() {
        let run = || {
            Optimizer::new(config())
                .unwrap()
                .run(&dataset(), &CancelToken::new())
                .unwrap()
        };

        assert_eq!(run().weights, run().weights);
    }

    #[test]
    fn test_empty_dataset() {
        let mut optimizer = Optimizer::new(config()).unwrap();
        assert!(matches!(
            optimizer.run(&Dataset::default(), &CancelToken::new()),
            Err(OptimizerError::EmptyDataset)
        ));
    }

    #[test]
    fn test_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut optimizer = Optimizer::new(config()).unwrap();
        assert!(matches!(
            optimizer.run(&dataset(), &cancel),
            Err(OptimizerError::Cancelled)
        ));
    }

    #[test]
    fn test_cancel_from_callback() {
        let cancel = CancelToken::new();
        let mut generations = 0;

        let result = Optimizer::new(config())
            .unwrap()
            .run_with(&dataset(), &cancel, |_| {
                generations += 1;
                cancel.cancel();
            });

        assert!(matches!(result, Err(OptimizerError::Cancelled)));
        assert_eq!(generations, 1);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Optimizer::new(OptimizerConfig {
                workers: 0,
                ..Default::default()
            }),
            Err(OptimizerError::InvalidConfig(_))
        ));
    }
}
