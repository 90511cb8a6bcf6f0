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

//! Evolves a random population of bit strings towards the all-ones target.

use genetic_algorithm::bit_string::{random_bit_string, BitStringProblem};
use genetic_algorithm::{Float, GeneticAlgorithm, GeneticAlgorithmConfig, Rng};
use rand::SeedableRng;

const POPULATION_SIZE: usize = 100;
const STRING_LENGTH: usize = 100;
const CROSSOVER_SHARE: Float = 0.5;
const MUTATION_SHARE: Float = 0.1;
const FITNESS_THRESHOLD: Float = 100.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut rng = Rng::from_entropy();
    let problem = BitStringProblem::all_ones(STRING_LENGTH);
    let population = (0..POPULATION_SIZE)
        .map(|_| random_bit_string(STRING_LENGTH, &mut rng))
        .collect();
    let config = GeneticAlgorithmConfig {
        fitness_threshold: FITNESS_THRESHOLD,
        crossover_share: CROSSOVER_SHARE,
        mutation_share: MUTATION_SHARE,
        max_generations: None,
    };

    let outcome = GeneticAlgorithm::new(
        &problem,
        population,
        Some(problem.target().to_vec()),
        config,
        rng,
    )
    .run();

    let best: String = outcome
        .best_hypothesis
        .iter()
        .map(|&bit| char::from(b'0' + bit))
        .collect();
    println!("target reached after {} generations", outcome.generations);
    println!("best hypothesis: {}, fitness: {}", best, outcome.best_fitness);
}
