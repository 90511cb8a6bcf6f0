/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

#![warn(missing_docs)]

//! A generic genetic algorithm over a population of hypotheses.
//!
//! Each generation is built by fitness-proportional roulette-wheel
//! selection, single-point crossover of distinct parent pairs, and mutation
//! of a configured share of individuals, with the best individual
//! re-inserted if selection dropped it. The domain supplies fitness,
//! crossover and mutation through the [`Problem`] trait.
//!
//! See Chapter 4: Search in Complex Environments, section 4.1.4
//! (evolutionary algorithms).

use std::fmt::Debug;

use rand::Rng as _;
use tracing::debug;

pub mod bit_string;

/// Fitness values and configuration shares.
pub type Float = f64;
/// The injected pseudo-random generator.
pub type Rng = rand_pcg::Pcg64;

/// Domain contract: what a hypothesis is and how it scores, breeds and
/// mutates. Fitness must be non-negative; selection weighs individuals by
/// `fitness / total fitness`.
pub trait Problem {
    /// One candidate solution.
    type Hypothesis: Clone + PartialEq + Debug;

    /// Non-negative score, higher is better.
    fn fitness(&self, hypothesis: &Self::Hypothesis) -> Float;

    /// Two children bred from two parents.
    fn crossover(
        &self,
        father: &Self::Hypothesis,
        mother: &Self::Hypothesis,
        rng: &mut Rng,
    ) -> (Self::Hypothesis, Self::Hypothesis);

    /// A mutated copy of the hypothesis.
    fn mutate(&self, hypothesis: &Self::Hypothesis, rng: &mut Rng) -> Self::Hypothesis;
}

/// Knobs of the generation loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticAlgorithmConfig {
    /// Stop once the best fitness reaches this value.
    pub fitness_threshold: Float,

    /// Share of the next generation filled by selection and replaced
    /// through crossover (`r` in the literature).
    pub crossover_share: Float,

    /// Share of the next generation that gets mutated (`m`).
    pub mutation_share: Float,

    /// Optional hard stop; `None` runs until the threshold or the optimum
    /// is reached.
    pub max_generations: Option<usize>,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            fitness_threshold: 100.0,
            crossover_share: 0.5,
            mutation_share: 0.1,
            max_generations: None,
        }
    }
}

/// What a finished run hands back.
#[derive(Debug, Clone)]
pub struct RunOutcome<H> {
    /// Fittest individual of the final population.
    pub best_hypothesis: H,

    /// Its fitness.
    pub best_fitness: Float,

    /// Generations bred before stopping.
    pub generations: usize,

    /// Best fitness recorded at the start of every generation, the final
    /// one included.
    pub best_fitness_per_generation: Vec<Float>,
}

/// The algorithm itself: a population, a problem, a config and a generator.
pub struct GeneticAlgorithm<'a, P: Problem> {
    problem: &'a P,
    config: GeneticAlgorithmConfig,
    population: Vec<P::Hypothesis>,
    optimum: Option<P::Hypothesis>,
    rng: Rng,
}

impl<'a, P: Problem> GeneticAlgorithm<'a, P> {
    /// Sets up a run over `population`. If the `optimum` hypothesis is
    /// known, its appearance in the population also stops the run.
    pub fn new(
        problem: &'a P,
        population: Vec<P::Hypothesis>,
        optimum: Option<P::Hypothesis>,
        config: GeneticAlgorithmConfig,
        rng: Rng,
    ) -> Self {
        assert!(!population.is_empty(), "population must not be empty");
        Self {
            problem,
            config,
            population,
            optimum,
            rng,
        }
    }

    /// Breeds generations until the fitness threshold, the known optimum or
    /// the generation cap is reached.
    pub fn run(mut self) -> RunOutcome<P::Hypothesis> {
        let population_size = self.population.len();
        let selection_count =
            (population_size as Float * self.config.crossover_share) as usize;
        let pair_count =
            (self.config.crossover_share * population_size as Float / 2.0) as usize;
        let mutation_count =
            (population_size as Float * self.config.mutation_share) as usize;

        let mut generations = 0;
        let mut best_fitness_per_generation = Vec::new();
        loop {
            let (best, best_fitness) = self.best_of_population();
            best_fitness_per_generation.push(best_fitness);
            debug!(generation = generations, best_fitness, "generation bred");

            if best_fitness >= self.config.fitness_threshold {
                break;
            }
            if let Some(optimum) = &self.optimum {
                if self.population.contains(optimum) {
                    break;
                }
            }
            if let Some(cap) = self.config.max_generations {
                if generations >= cap {
                    break;
                }
            }

            let fitnesses: Vec<Float> = self
                .population
                .iter()
                .map(|hypothesis| self.problem.fitness(hypothesis))
                .collect();

            let mut next_generation: Vec<P::Hypothesis> =
                Vec::with_capacity(population_size + 1);

            // Selection
            while next_generation.len() < selection_count {
                let index = weighted_random_index(&fitnesses, &mut self.rng);
                next_generation.push(self.population[index].clone());
            }

            // Crossover of distinct parents. A fully converged population
            // cannot supply two distinct parents, so the draw is bounded.
            let mut pairs = 0;
            let mut failed_draws = 0;
            while pairs < pair_count && failed_draws < 10 * population_size {
                let father = weighted_random_index(&fitnesses, &mut self.rng);
                let mother = weighted_random_index(&fitnesses, &mut self.rng);
                if self.population[father] == self.population[mother] {
                    failed_draws += 1;
                    continue;
                }
                pairs += 1;
                let (first_child, second_child) = self.problem.crossover(
                    &self.population[father],
                    &self.population[mother],
                    &mut self.rng,
                );
                next_generation.push(first_child);
                next_generation.push(second_child);
            }

            // Mutation
            for _ in 0..mutation_count {
                let index = self.rng.gen_range(0..next_generation.len());
                let mutated = self.problem.mutate(&next_generation[index], &mut self.rng);
                next_generation[index] = mutated;
            }

            // keep the best individual
            if !next_generation.contains(&best) {
                next_generation.push(best);
            }

            self.population = next_generation;
            generations += 1;
        }

        let (best_hypothesis, best_fitness) = self.best_of_population();
        RunOutcome {
            best_hypothesis,
            best_fitness,
            generations,
            best_fitness_per_generation,
        }
    }

    fn best_of_population(&self) -> (P::Hypothesis, Float) {
        let mut best = 0;
        let mut best_fitness = self.problem.fitness(&self.population[0]);
        for (index, hypothesis) in self.population.iter().enumerate().skip(1) {
            let fitness = self.problem.fitness(hypothesis);
            if fitness > best_fitness {
                best = index;
                best_fitness = fitness;
            }
        }
        (self.population[best].clone(), best_fitness)
    }
}

/// Cumulative-probability roulette wheel: walk indices cyclically from a
/// uniformly random start, accumulating normalized weight, and return the
/// first index at which the accumulated mass exceeds a uniform [0, 1) draw.
fn weighted_random_index(weights: &[Float], rng: &mut Rng) -> usize {
    let draw: Float = rng.gen();
    let total: Float = weights.iter().sum();
    let mut index = rng.gen_range(0..weights.len());
    if total == 0.0 {
        // nothing to weigh, the random start is as good as any index
        return index;
    }
    let mut accumulated = 0.0;
    loop {
        index = (index + 1) % weights.len();
        accumulated += weights[index] / total;
        if draw < accumulated {
            return index;
        }
    }
}
