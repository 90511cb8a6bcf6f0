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

//! Randomized local search: hill climbing and simulated annealing over a
//! shared problem contract.
//!
//! See Chapter 4: Search in Complex Environments, sections 4.1.1 and 4.1.2.

use rand::Rng as _;
use tracing::debug;

pub mod tsp;

pub type Float = f64;
pub type Rng = rand_pcg::Pcg64;

/// What a domain must supply: a starting point, a fitness (higher is
/// better) and a random neighbour.
pub trait Problem {
    type Hypothesis: Clone;

    fn start_hypothesis(&self) -> Self::Hypothesis;
    fn fitness(&self, hypothesis: &Self::Hypothesis) -> Float;
    fn random_step(&self, hypothesis: &Self::Hypothesis, rng: &mut Rng)
        -> Self::Hypothesis;
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<H> {
    pub hypothesis: H,
    pub fitness: Float,
    pub iterations: usize,
}

/// Keeps a random neighbour only on strict fitness improvement, for a fixed
/// number of iterations.
pub fn hill_climb<P: Problem>(
    problem: &P,
    iterations: usize,
    rng: &mut Rng,
) -> SearchOutcome<P::Hypothesis> {
    let mut hypothesis = problem.start_hypothesis();
    let mut last_fitness = problem.fitness(&hypothesis);
    debug!(start_fitness = last_fitness, "hill climbing");

    for _ in 0..iterations {
        let candidate = problem.random_step(&hypothesis, rng);
        let fitness = problem.fitness(&candidate);
        if fitness > last_fitness {
            debug!(fitness, "new fitness");
            last_fitness = fitness;
            hypothesis = candidate;
        }
    }

    SearchOutcome {
        hypothesis,
        fitness: last_fitness,
        iterations,
    }
}

/// Accepts a random neighbour when a uniform draw falls below
/// `exp((f' - f) / T)`, so improving moves are always taken and worsening
/// moves become rarer as the temperature cools by `epsilon` per iteration.
/// Stops once the temperature drops below `epsilon`.
pub fn simulated_annealing<P: Problem>(
    problem: &P,
    start_temperature: Float,
    epsilon: Float,
    rng: &mut Rng,
) -> SearchOutcome<P::Hypothesis> {
    assert!(epsilon > 0.0, "epsilon must be positive");

    let mut hypothesis = problem.start_hypothesis();
    let mut last_fitness = problem.fitness(&hypothesis);
    let mut temperature = start_temperature;
    let mut iterations = 0;
    debug!(start_fitness = last_fitness, "simulated annealing");

    loop {
        let candidate = problem.random_step(&hypothesis, rng);
        iterations += 1;
        let fitness = problem.fitness(&candidate);
        if rng.gen::<Float>() < ((fitness - last_fitness) / temperature).exp() {
            debug!(fitness, temperature, "accepted");
            last_fitness = fitness;
            hypothesis = candidate;
        }
        temperature -= epsilon;
        if temperature < epsilon {
            break;
        }
    }

    SearchOutcome {
        hypothesis,
        fitness: last_fitness,
        iterations,
    }
}
