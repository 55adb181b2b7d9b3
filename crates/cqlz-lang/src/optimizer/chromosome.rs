use std::fmt;

use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::compiler::{CompileError, Weights};

/// A candidate weight vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chromosome(Vec<f64>);

impl Chromosome {
    pub fn new(genes: Vec<f64>) -> Self {
        Self(genes)
    }

    /// Draws every gene uniformly from `[0, max_gene_value)`.
    pub fn random<R: Rng + ?Sized>(dimension: usize, max_gene_value: f64, rng: &mut R) -> Self {
        Self(
            (0..dimension)
                .map(|_| random_gene(max_gene_value, rng))
                .collect(),
        )
    }

    pub fn genes(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Single point crossover. The split point is drawn from `[0, len)` and a
    /// coin flip decides which parent gives the prefix.
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Chromosome, rng: &mut R) -> Chromosome {
        if self.is_empty() {
            return other.clone();
        }

        let split = rng.gen_range(0..self.len());
        let (head, tail) = if rng.gen_bool(0.5) {
            (self, other)
        } else {
            (other, self)
        };

        Self(
            head.0
                .iter()
                .take(split)
                .chain(tail.0.iter().skip(split))
                .copied()
                .collect(),
        )
    }

    /// Replaces each gene with a fresh random value with probability `probability`.
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        probability: f64,
        max_gene_value: f64,
        rng: &mut R,
    ) -> Chromosome {
        Self(
            self.0
                .iter()
                .map(|&gene| {
                    if rng.gen_range(0.0..1.0) < probability {
                        random_gene(max_gene_value, rng)
                    } else {
                        gene
                    }
                })
                .collect(),
        )
    }

    pub fn to_weights(&self) -> Result<Weights, CompileError> {
        Weights::from_vec(self.0.clone())
    }
}

impl From<Weights> for Chromosome {
    fn from(weights: Weights) -> Self {
        Self(weights.into())
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.0.iter().map(|gene| format!("{gene:.4}")).join(", ")
        )
    }
}

fn random_gene<R: Rng + ?Sized>(max_gene_value: f64, rng: &mut R) -> f64 {
    rng.gen_range(0.0..1.0) * max_gene_value
}
