use rand::Rng;

use super::chromosome::Chromosome;
use super::config::OptimizerConfig;
use super::fitness::EvalStats;

#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub chromosome: Chromosome,
    /// `None` until evaluated.
    pub stats: Option<EvalStats>,
}

impl Individual {
    pub fn new(chromosome: Chromosome) -> Self {
        Self {
            chromosome,
            stats: None,
        }
    }

    pub fn fitness(&self) -> f64 {
        self.stats.map_or(f64::INFINITY, |stats| stats.fitness())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn random<R: Rng + ?Sized>(config: &OptimizerConfig, dimension: usize, rng: &mut R) -> Self {
        Self::new(
            (0..config.population_size)
                .map(|_| {
                    Individual::new(Chromosome::random(dimension, config.max_gene_value, rng))
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    /// Sorts by ascending error. Unevaluated individuals go last.
    pub fn sort(&mut self) {
        self.individuals
            .sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));
    }

    /// First individual, the best one after [`Population::sort`].
    pub fn best(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    pub fn worst(&self) -> Option<&Individual> {
        self.individuals.last()
    }

    /// Breeds the next generation from the top [`OptimizerConfig::parent_pool_size`]
    /// individuals. The population must be sorted.
    pub fn breed<R: Rng + ?Sized>(
        &self,
        config: &OptimizerConfig,
        generation: usize,
        rng: &mut R,
    ) -> Population {
        if self.is_empty() {
            return Population::default();
        }

        let parents = config.parent_pool_size().min(self.len());
        let probability = config.mutation_probability_at(generation);

        Self::new(
            (0..config.population_size)
                .map(|_| {
                    let a = &self.individuals[rng.gen_range(0..parents)].chromosome;
                    let b = &self.individuals[rng.gen_range(0..parents)].chromosome;
                    let child = a
                        .crossover(b, rng)
                        .mutate(probability, config.max_gene_value, rng);
                    Individual::new(child)
                })
                .collect(),
        )
    }
}

/// Sizes of `pieces` contiguous chunks covering `len` items. The first
/// `len % pieces` chunks hold one extra item.
pub fn chunk_sizes(len: usize, pieces: usize) -> Vec<usize> {
    if pieces == 0 {
        return Vec::new();
    }

    let (size, missing) = (len / pieces, len % pieces);
    (0..pieces)
        .map(|i| if i < missing { size + 1 } else { size })
        .filter(|size| *size > 0)
        .collect()
}

pub fn split_chunks<T>(mut items: &mut [T], pieces: usize) -> Vec<&mut [T]> {
    let sizes = chunk_sizes(items.len(), pieces);
    let mut chunks = Vec::with_capacity(sizes.len());

    for size in sizes {
        let (head, tail) = std::mem::take(&mut items).split_at_mut(size);
        chunks.push(head);
        items = tail;
    }

    chunks
}
