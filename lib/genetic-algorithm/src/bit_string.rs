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

//! Bit-string optimization: evolve a population of fixed-length bit strings
//! towards a target string. Fitness is the number of matching positions
//! (string length minus Hamming distance).

use rand::Rng as _;

use crate::{Float, Problem, Rng};

/// A bit string as a vector of 0/1 bytes.
pub type BitString = Vec<u8>;

/// The target-matching problem. Crossover swaps tails at a random interior
/// point; mutation flips one random bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStringProblem {
    target: BitString,
}

impl BitStringProblem {
    /// A problem aiming for the given target string.
    pub fn new(target: BitString) -> Self {
        assert!(target.len() > 1, "target must have at least two bits");
        Self { target }
    }

    /// The classic benchmark target of all ones.
    pub fn all_ones(length: usize) -> Self {
        Self::new(vec![1; length])
    }

    /// The string the population is evolving towards.
    pub fn target(&self) -> &[u8] {
        &self.target
    }
}

impl Problem for BitStringProblem {
    type Hypothesis = BitString;

    fn fitness(&self, hypothesis: &BitString) -> Float {
        let matching = hypothesis
            .iter()
            .zip(&self.target)
            .filter(|(bit, target_bit)| bit == target_bit)
            .count();
        matching as Float
    }

    fn crossover(
        &self,
        father: &BitString,
        mother: &BitString,
        rng: &mut Rng,
    ) -> (BitString, BitString) {
        let point = rng.gen_range(1..father.len());
        let mut first_child = father[..point].to_vec();
        first_child.extend_from_slice(&mother[point..]);
        let mut second_child = mother[..point].to_vec();
        second_child.extend_from_slice(&father[point..]);
        (first_child, second_child)
    }

    fn mutate(&self, hypothesis: &BitString, rng: &mut Rng) -> BitString {
        let index = rng.gen_range(0..hypothesis.len());
        let mut mutated = hypothesis.clone();
        mutated[index] ^= 1;
        mutated
    }
}

/// A uniformly random bit string of the given length.
pub fn random_bit_string(length: usize, rng: &mut Rng) -> BitString {
    (0..length).map(|_| rng.gen_range(0..=1)).collect()
}
