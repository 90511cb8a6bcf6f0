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

//! A toy travelling-salesman instance over a symmetric integer distance
//! matrix. A hypothesis is a tour visiting every node once; its fitness is
//! the negated tour length (no return to the start), so higher is better.

use rand::Rng as _;

use crate::{Float, Problem, Rng};

/// A tour as the sequence of visited node indices.
pub type Tour = Vec<usize>;

pub struct TravellingSalesman {
    distances: Vec<Vec<u32>>,
}

impl TravellingSalesman {
    /// A salesman over an explicit distance matrix, which must be square
    /// and symmetric with a zero diagonal.
    pub fn new(distances: Vec<Vec<u32>>) -> Self {
        let node_count = distances.len();
        assert!(node_count >= 2, "need at least two nodes");
        for (i, row) in distances.iter().enumerate() {
            assert_eq!(row.len(), node_count, "distance matrix must be square");
            assert_eq!(row[i], 0, "distance matrix diagonal must be zero");
            for (j, &distance) in row.iter().enumerate() {
                assert_eq!(
                    distance, distances[j][i],
                    "distance matrix must be symmetric"
                );
            }
        }
        Self { distances }
    }

    /// A random instance with distances drawn uniformly from
    /// `1..=max_distance`.
    pub fn random(node_count: usize, max_distance: u32, rng: &mut Rng) -> Self {
        let mut distances = vec![vec![0; node_count]; node_count];
        for i in 0..node_count {
            for j in (i + 1)..node_count {
                let distance = rng.gen_range(1..=max_distance);
                distances[i][j] = distance;
                distances[j][i] = distance;
            }
        }
        Self::new(distances)
    }

    pub fn node_count(&self) -> usize {
        self.distances.len()
    }

    pub fn distances(&self) -> &[Vec<u32>] {
        &self.distances
    }

    /// Sum of the distances between consecutive tour stops.
    pub fn tour_length(&self, tour: &[usize]) -> u32 {
        tour.windows(2)
            .map(|stops| self.distances[stops[0]][stops[1]])
            .sum()
    }
}

impl Problem for TravellingSalesman {
    type Hypothesis = Tour;

    fn start_hypothesis(&self) -> Tour {
        (0..self.node_count()).collect()
    }

    fn fitness(&self, tour: &Tour) -> Float {
        -Float::from(self.tour_length(tour))
    }

    /// Swaps two distinct random tour positions.
    fn random_step(&self, tour: &Tour, rng: &mut Rng) -> Tour {
        let first = rng.gen_range(0..tour.len());
        let mut second = rng.gen_range(0..tour.len());
        while second == first {
            second = rng.gen_range(0..tour.len());
        }
        let mut stepped = tour.clone();
        stepped.swap(first, second);
        stepped
    }
}
