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

//! Classifies the two-arm spiral dataset with a k-nearest-neighbour model
//! and reports the held-out accuracy.

use nearest_neighbour::{
    accuracy, spiral_dataset, train_test_split, Float, KNearestNeighbourClassifier, Rng,
};
use rand::SeedableRng;

const K: usize = 3;
const POINTS_PER_CLASS: usize = 100;
const NOISE: Float = 0.05;
const TEST_FRACTION: Float = 0.2;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut rng = Rng::from_entropy();
    let points = spiral_dataset(POINTS_PER_CLASS, NOISE, &mut rng);
    let (training, test) = train_test_split(points, TEST_FRACTION, &mut rng);

    let classifier = KNearestNeighbourClassifier::new(K, training);
    let score = accuracy(&classifier, &test);
    println!(
        "test accuracy: {:.1}% over {} held-out points",
        score * 100.0,
        test.len()
    );

    let probe = [0.5, 0.5];
    println!(
        "prediction for {:?}: class {}",
        probe,
        classifier.predict(&probe)
    );
}
