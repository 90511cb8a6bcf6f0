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

//! Optimizes a random travelling-salesman instance with hill climbing and
//! simulated annealing and prints both round trips.

use local_search::tsp::TravellingSalesman;
use local_search::{hill_climb, simulated_annealing, Float, Rng, SearchOutcome};
use rand::SeedableRng;

const NUMBER_OF_NODES: usize = 8;
const MAX_DISTANCE: u32 = 10;

// only for hill climbing
const ITERATIONS: usize = 100_000;
// only for simulated annealing
const TEMPERATURE: Float = 10.0;
const EPSILON: Float = 0.1;

fn print_outcome(name: &str, salesman: &TravellingSalesman, outcome: &SearchOutcome<Vec<usize>>) {
    println!("{}", name);
    println!(
        "  shortest round trip: {:?}, distance: {}",
        outcome.hypothesis,
        salesman.tour_length(&outcome.hypothesis)
    );
    println!("  iterations: {}", outcome.iterations);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut rng = Rng::from_entropy();
    let salesman = TravellingSalesman::random(NUMBER_OF_NODES, MAX_DISTANCE, &mut rng);

    println!("distance matrix:");
    for row in salesman.distances() {
        println!("  {:?}", row);
    }

    let climbed = hill_climb(&salesman, ITERATIONS, &mut rng);
    let annealed = simulated_annealing(&salesman, TEMPERATURE, EPSILON, &mut rng);

    print_outcome("hill climbing", &salesman, &climbed);
    print_outcome("simulated annealing", &salesman, &annealed);
}
