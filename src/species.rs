//! Species (C3): a bag of genomes sharing a representative.
//!
//! Tracks stagnation against the species' own best-ever fitness and runs
//! intra-species reproduction (elitism, culling, crossover/mutation split).
//! Grounded on `original_source/src/Species.cpp`'s `Species` class — the
//! elitism-if-more-than-five rule, the `by_mutation = floor(n * mut_pct)`
//! split, the pairwise `(i, i+1..)` crossover walk and the self-crossover
//! path for a single survivor all mirror `Species::Reproduce` exactly — with
//! the Rust idiom (owned `Vec<Genome>` return, `Result`-typed mutation) taken
//! from `examples/sgshea-neat/src/specie.rs`'s `Specie::make_child`.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::error::Result;
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::params::{CompatDistParams, MutateParams};

/// A species: a representative genome (sampled from the prior generation)
/// plus this generation's members, and a stagnation counter against the
/// best fitness this species has ever produced.
#[derive(Debug, Clone)]
pub struct Species {
    pub representative: Genome,
    pub members: Vec<Genome>,
    max_fitness_seen: f64,
    generations_since_improvement: usize,
}

impl Species {
    /// A fresh species seeded by `founder`, who is both its first member and
    /// its initial representative.
    pub fn new(founder: Genome) -> Self {
        Species {
            representative: founder.clone(),
            members: vec![founder],
            max_fitness_seen: 0.0,
            generations_since_improvement: 0,
        }
    }

    /// Compute the compatibility distance of `genome` to this species'
    /// representative; if within `threshold`, add it and return true.
    pub fn try_add(&mut self, genome: Genome, threshold: f64, params: &CompatDistParams) -> bool {
        let distance = self.representative.compatibility_distance(&genome, params);
        if distance > threshold {
            return false;
        }
        self.members.push(genome);
        true
    }

    /// `fitness /= member_count` for every member (spec.md §4.2's adjusted
    /// fitness, implementing fitness sharing).
    pub fn calc_adjusted_fitness(&mut self) {
        let size = self.members.len();
        for genome in &mut self.members {
            genome.apply_fitness_sharing(size);
        }
    }

    pub fn total_adjusted_fitness(&self) -> f64 {
        self.members.iter().map(|g| g.fitness).sum()
    }

    /// Update the stagnation counter against this species' best-ever fitness
    /// (computed over *adjusted* fitness, since this is always called after
    /// `calc_adjusted_fitness` per spec.md §4.4). Returns false once the
    /// counter reaches `gen_threshold` — the caller must starve this species.
    pub fn check_stagnation(&mut self, gen_threshold: usize) -> bool {
        let current_max = self
            .members
            .iter()
            .map(|g| g.fitness)
            .fold(0.0_f64, f64::max);

        if current_max > self.max_fitness_seen {
            self.max_fitness_seen = current_max;
            self.generations_since_improvement = 0;
        } else {
            self.generations_since_improvement += 1;
        }

        self.generations_since_improvement < gen_threshold
    }

    /// Sample a random member as the next generation's representative, then
    /// drop all members. Called once per generation after `reproduce`.
    pub fn clear(&mut self, rng: &mut impl Rng) {
        if let Some(next_rep) = self.members.choose(rng) {
            self.representative = next_rep.clone();
        }
        self.members.clear();
    }

    /// Produce exactly `n_offspring` children from this species' members.
    /// See spec.md §4.3 for the eight-step procedure.
    pub fn reproduce(
        &mut self,
        n_offspring: usize,
        kill_percent: f64,
        mut_percent: f64,
        mutate_params: &MutateParams,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Result<Vec<Genome>> {
        if n_offspring == 0 || self.members.is_empty() {
            return Ok(Vec::new());
        }

        self.members
            .sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(std::cmp::Ordering::Equal));

        let mut offspring = Vec::with_capacity(n_offspring);

        // Elitism: species of more than five members carry their champion
        // forward unchanged (original fitness kept, per spec.md §9's
        // open-question resolution).
        if self.members.len() > 5 {
            offspring.push(self.members[0].clone());
            if offspring.len() >= n_offspring {
                offspring.truncate(n_offspring);
                return Ok(offspring);
            }
        }

        let keep = ((self.members.len() as f64) * (1.0 - kill_percent))
            .round()
            .max(1.0) as usize;
        let survivors = &self.members[..keep.min(self.members.len())];

        let remaining = n_offspring - offspring.len();
        let by_mutation = ((remaining as f64) * mut_percent).floor() as usize;
        let by_crossover = remaining - by_mutation;

        if by_crossover > 0 {
            offspring.extend(self.crossover_batch(survivors, by_crossover, registry, rng));
        }

        if by_mutation > 0 {
            offspring.extend(self.mutation_batch(survivors, by_mutation, mutate_params, registry, rng)?);
        }

        debug_assert_eq!(offspring.len(), n_offspring);
        Ok(offspring)
    }

    /// Pairwise `(i, i+1..)` crossover walk over `survivors`, wrapping back
    /// to the start as needed; self-crossover when only one survivor
    /// remains, matching `Species::Reproduce`'s `this->Organisms.size() == 1`
    /// branch.
    fn crossover_batch(
        &self,
        survivors: &[Genome],
        count: usize,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Vec<Genome> {
        let mut children = Vec::with_capacity(count);

        if survivors.len() == 1 {
            let solo = &survivors[0];
            for _ in 0..count {
                children.push(solo.crossover(solo, registry, rng));
            }
            return children;
        }

        'outer: loop {
            for i in 0..survivors.len() {
                for j in (i + 1)..survivors.len() {
                    children.push(survivors[i].crossover(&survivors[j], registry, rng));
                    if children.len() >= count {
                        break 'outer;
                    }
                }
            }
        }
        children
    }

    /// Mutated clones of `survivors`, cycled in order; child fitness is
    /// reset to zero (spec.md §9's open-question resolution: clonal and
    /// crossover offspring are re-evaluated from scratch, the elite copy is
    /// not).
    fn mutation_batch(
        &self,
        survivors: &[Genome],
        count: usize,
        mutate_params: &MutateParams,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Result<Vec<Genome>> {
        let mut children = Vec::with_capacity(count);
        let mut i = 0;
        while children.len() < count {
            let mut child = survivors[i % survivors.len()].clone();
            child.mutate(mutate_params, registry, rng)?;
            child.fitness = 0.0;
            children.push(child);
            i += 1;
        }
        Ok(children)
    }
}
