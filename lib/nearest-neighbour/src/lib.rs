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

//! k-nearest-neighbour classification with Euclidean distance and majority
//! vote, plus train/test splitting and the two-class spiral dataset the
//! demo classifies.

use std::f64::consts::PI;
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::Rng as _;

pub type Float = f64;
pub type Rng = rand_pcg::Pcg64;
pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A feature vector with its class label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledPoint<L> {
    pub features: Vec<Float>,
    pub label: L,
}

pub struct KNearestNeighbourClassifier<L> {
    k: usize,
    points: Vec<LabelledPoint<L>>,
}

impl<L: Clone + Eq + Hash> KNearestNeighbourClassifier<L> {
    pub fn new(k: usize, training: Vec<LabelledPoint<L>>) -> Self {
        assert!(k >= 1, "k must be at least 1");
        assert!(!training.is_empty(), "training set must not be empty");
        Self {
            k,
            points: training,
        }
    }

    /// Majority vote of the k nearest training points. An exact feature
    /// match short-circuits to that point's label; a vote tie goes to the
    /// label seen first in distance order.
    pub fn predict(&self, features: &[Float]) -> L {
        if let Some(exact) = self
            .points
            .iter()
            .find(|point| point.features == features)
        {
            return exact.label.clone();
        }

        let mut neighbours: Vec<(Float, &L)> = self
            .points
            .iter()
            .map(|point| (euclidean_distance(&point.features, features), &point.label))
            .collect();
        neighbours.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let nearest = &neighbours[..self.k.min(neighbours.len())];

        let mut votes: HashMap<&L, usize> = HashMap::default();
        for &(_, label) in nearest {
            *votes.entry(label).or_insert(0) += 1;
        }
        let top_count = votes.values().copied().max().unwrap();
        let (_, winner) = nearest
            .iter()
            .find(|(_, label)| votes[label] == top_count)
            .unwrap();
        (*winner).clone()
    }
}

/// Straight-line distance between two feature vectors of equal length.
pub fn euclidean_distance(first: &[Float], second: &[Float]) -> Float {
    assert_eq!(first.len(), second.len(), "feature lengths differ");
    first
        .iter()
        .zip(second)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<Float>()
        .sqrt()
}

/// Shuffles `data` with the given generator and splits off a test set of
/// `test_fraction` of the points. Returns `(training, test)`.
pub fn train_test_split<T>(
    mut data: Vec<T>,
    test_fraction: Float,
    rng: &mut Rng,
) -> (Vec<T>, Vec<T>) {
    assert!(
        (0.0..=1.0).contains(&test_fraction),
        "test fraction must be in [0, 1]"
    );
    data.shuffle(rng);
    let test_count = (data.len() as Float * test_fraction).round() as usize;
    let training = data.split_off(test_count);
    (training, data)
}

/// Share of test points the classifier labels correctly.
pub fn accuracy<L: Clone + Eq + Hash>(
    classifier: &KNearestNeighbourClassifier<L>,
    test: &[LabelledPoint<L>],
) -> Float {
    if test.is_empty() {
        return 0.0;
    }
    let correct = test
        .iter()
        .filter(|point| classifier.predict(&point.features) == point.label)
        .count();
    correct as Float / test.len() as Float
}

/// Two interleaved spiral arms of `points_per_class` points each, labelled
/// 0 and 1, with uniform jitter of half `noise` in each direction. The
/// arms start away from the origin so the classes never coincide.
pub fn spiral_dataset(
    points_per_class: usize,
    noise: Float,
    rng: &mut Rng,
) -> Vec<LabelledPoint<u8>> {
    let mut points = Vec::with_capacity(2 * points_per_class);
    for index in 0..points_per_class {
        let radius = 0.1 + 0.9 * index as Float / points_per_class as Float;
        let angle = 3.0 * PI * radius;
        for (label, offset) in [(0u8, 0.0), (1u8, PI)] {
            let x = radius * (angle + offset).cos() + noise * (rng.gen::<Float>() - 0.5);
            let y = radius * (angle + offset).sin() + noise * (rng.gen::<Float>() - 0.5);
            points.push(LabelledPoint {
                features: vec![x, y],
                label,
            });
        }
    }
    points
}
