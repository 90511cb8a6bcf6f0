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

//! Tabular Q-learning over a discretized multi-dimensional state space.
//!
//! The agent owns the Q-table and the action-selection policy. Everything
//! domain-specific (game mechanics, rewards, termination) lives behind the
//! [`Environment`] trait and is driven synchronously, one step at a time.
//!
//! See Chapter 22: Reinforcement Learning, section 22.3 (temporal-difference
//! Q-learning).

use std::str::FromStr;

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type Int = i32;
pub type Float = f64;
pub type Rng = rand_pcg::Pcg64;

/// Ordered tuple of raw values, one per state dimension. Every value must be
/// a member of the corresponding dimension's declared value sequence.
pub type StateVector = Vec<Int>;

/// The domain the agent learns in. The environment owns all game state; the
/// agent only ever refers to actions by index and to states by the vectors
/// the environment hands back.
pub trait Environment {
    type Action;

    /// Ordered, fixed action set. Its length is the Q-table's column count.
    fn actions(&self) -> &[Self::Action];

    /// One ordered, deduplicated sequence of legal discrete values per state
    /// dimension. Defines the discretization grid; the product of the
    /// sequence lengths is the Q-table's row count.
    fn state_dimension_values(&self) -> &[Vec<Int>];

    /// Performs the action, returning the reward and the successor state.
    /// May raise the termination signal as a side effect.
    fn apply_action(&mut self, action_index: usize) -> (Float, StateVector);

    /// Whether the current episode has ended. Polled by the agent after
    /// every step; there is no step-count cap, so an environment that never
    /// terminates produces an infinite episode.
    fn terminated(&self) -> bool;

    /// Clears the termination signal. Called by [`QLearningAgent::learn`]
    /// before each episode; the environment owns the flag, so the reset
    /// lives here.
    fn begin_episode(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// The strategy tag is not one of the known action-selection strategies.
    #[error("select action strategy must be greedy, e_greedy or softmax, got {0:?}")]
    InvalidConfiguration(String),

    /// A state dimension value is absent from the declared discretization
    /// grid. No clamping happens inside the agent; clamping, if desired, is
    /// the environment's job before calling in.
    #[error("value {value} is not a declared value of state dimension {dimension}")]
    StateResolution { dimension: usize, value: Int },

    /// `learn` was called before `init_state`.
    #[error("no initial state recorded, call init_state first")]
    MissingInitialState,
}

/// How the agent picks an action from a Q-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectActionStrategy {
    /// Always the first maximizer of the row.
    Greedy,

    /// A uniformly random action with probability epsilon, greedy otherwise.
    EpsilonGreedy,

    /// Roulette-wheel draw over softmax weights of the row at a fixed
    /// temperature.
    Softmax,
}

impl FromStr for SelectActionStrategy {
    type Err = AgentError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "greedy" => Ok(SelectActionStrategy::Greedy),
            "e_greedy" => Ok(SelectActionStrategy::EpsilonGreedy),
            "softmax" => Ok(SelectActionStrategy::Softmax),
            _ => Err(AgentError::InvalidConfiguration(tag.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Number of learning trials to run.
    pub episodes: usize,

    /// Discount factor gamma in [0, 1].
    pub discount_factor: Float,

    /// Learning rate alpha in (0, 1].
    pub learning_rate: Float,

    pub strategy: SelectActionStrategy,

    /// Probability of a random action. Only read by `EpsilonGreedy`.
    pub epsilon: Float,

    /// Softmax temperature, nonzero and positive. Only read by `Softmax`.
    pub temperature: Float,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            episodes: 5000,
            discount_factor: 0.9,
            learning_rate: 0.01,
            strategy: SelectActionStrategy::EpsilonGreedy,
            epsilon: 0.1,
            temperature: 1.0,
        }
    }
}

#[derive(Serialize)]
struct QTableSnapshot<'a> {
    dimension_sizes: Vec<usize>,
    action_count: usize,
    q_values: &'a [Vec<Float>],
}

/// Tabular Q-learning agent. The Q-table has one row per combination of
/// dimension values and one column per action; it is allocated once at
/// construction and never resized.
pub struct QLearningAgent {
    config: AgentConfig,
    dimension_values: Vec<Vec<Int>>,
    action_count: usize,
    q_table: Vec<Vec<Float>>,
    rng: Rng,
    initial_state: Option<StateVector>,
    current_index: usize,
}

impl QLearningAgent {
    /// Derives the table shape from the environment's declared metadata and
    /// allocates the Q-table: independent uniform values in [0, 1) for the
    /// greedy strategies, all zeros for softmax so the exponentials start
    /// well-defined.
    pub fn new<E: Environment>(environment: &E, config: AgentConfig, mut rng: Rng) -> Self {
        let dimension_values = environment.state_dimension_values().to_vec();
        let row_count = dimension_values.iter().map(Vec::len).product();
        let action_count = environment.actions().len();
        let q_table = match config.strategy {
            SelectActionStrategy::Softmax => vec![vec![0.0; action_count]; row_count],
            SelectActionStrategy::Greedy | SelectActionStrategy::EpsilonGreedy => (0..row_count)
                .map(|_| (0..action_count).map(|_| rng.gen::<Float>()).collect())
                .collect(),
        };
        Self {
            config,
            dimension_values,
            action_count,
            q_table,
            rng,
            initial_state: None,
            current_index: 0,
        }
    }

    /// Records `state` as the episode-reset state and makes its index the
    /// agent's current one.
    pub fn init_state(&mut self, state: &[Int]) -> Result<(), AgentError> {
        self.current_index = self.state_index(state)?;
        self.initial_state = Some(state.to_vec());
        Ok(())
    }

    /// Resolves a state vector to its Q-table row via mixed-radix encoding
    /// of the per-dimension value positions. The encoding must match the
    /// table layout exactly; the reverse mapping is never needed.
    pub fn state_index(&self, state: &[Int]) -> Result<usize, AgentError> {
        assert_eq!(
            state.len(),
            self.dimension_values.len(),
            "state vector has the wrong number of dimensions"
        );
        let mut index = 0;
        for (dimension, values) in self.dimension_values.iter().enumerate() {
            let position = values
                .iter()
                .position(|&value| value == state[dimension])
                .ok_or(AgentError::StateResolution {
                    dimension,
                    value: state[dimension],
                })?;
            index = index * values.len() + position;
        }
        Ok(index)
    }

    /// Runs the configured number of episodes. Each episode starts from the
    /// state recorded by [`init_state`](Self::init_state) and steps until
    /// the environment raises its termination signal.
    pub fn learn<E: Environment>(&mut self, environment: &mut E) -> Result<(), AgentError> {
        let initial_state = self
            .initial_state
            .clone()
            .ok_or(AgentError::MissingInitialState)?;
        for episode in 0..self.config.episodes {
            debug!(episode, "episode start");
            environment.begin_episode();
            self.current_index = self.state_index(&initial_state)?;
            loop {
                self.state_reaction(environment, None)?;
                if environment.terminated() {
                    break;
                }
            }
        }
        Ok(())
    }

    /// One environment step: select an action for the acting state (the
    /// override's index if given, the tracked index otherwise), apply it,
    /// back up the Q-value, advance the tracked index, and return the chosen
    /// action index.
    pub fn state_reaction<E: Environment>(
        &mut self,
        environment: &mut E,
        state_override: Option<&[Int]>,
    ) -> Result<usize, AgentError> {
        let acting_index = match state_override {
            Some(state) => self.state_index(state)?,
            None => self.current_index,
        };
        let action_index = self.select_action(acting_index);
        let (reward, next_state) = environment.apply_action(action_index);
        let next_index = self.state_index(&next_state)?;
        self.update_q_value(acting_index, action_index, reward, next_index);
        self.current_index = next_index;
        Ok(action_index)
    }

    /// One-step Q-learning backup, applied in place immediately after each
    /// step:
    ///
    /// `Q[s][a] <- Q[s][a] + alpha * (reward + gamma * max Q[s'] - Q[s][a])`
    fn update_q_value(
        &mut self,
        state_index: usize,
        action_index: usize,
        reward: Float,
        next_index: usize,
    ) {
        let max_next = self.q_table[next_index]
            .iter()
            .copied()
            .fold(Float::NEG_INFINITY, Float::max);
        let q = &mut self.q_table[state_index][action_index];
        *q += self.config.learning_rate
            * (reward + self.config.discount_factor * max_next - *q);
    }

    fn select_action(&mut self, state_index: usize) -> usize {
        match self.config.strategy {
            SelectActionStrategy::Greedy => self.greedy_selection(state_index),
            SelectActionStrategy::EpsilonGreedy => {
                if self.rng.gen::<Float>() < self.config.epsilon {
                    self.rng.gen_range(0..self.action_count)
                } else {
                    self.greedy_selection(state_index)
                }
            }
            SelectActionStrategy::Softmax => self.softmax_selection(state_index),
        }
    }

    /// First maximizer in a single left-to-right scan, so ties go to the
    /// lowest action index.
    fn greedy_selection(&self, state_index: usize) -> usize {
        let row = &self.q_table[state_index];
        let mut best = 0;
        for (action_index, q) in row.iter().enumerate().skip(1) {
            if *q > row[best] {
                best = action_index;
            }
        }
        best
    }

    fn softmax_selection(&mut self, state_index: usize) -> usize {
        let temperature = self.config.temperature;
        let weights: Vec<Float> = self.q_table[state_index]
            .iter()
            .map(|q| (q / temperature).exp())
            .collect();
        weighted_random_index(&weights, &mut self.rng)
    }

    pub fn q_value(&self, state_index: usize, action_index: usize) -> Float {
        self.q_table[state_index][action_index]
    }

    pub fn current_state_index(&self) -> usize {
        self.current_index
    }

    /// JSON snapshot of the learned table for post-training inspection.
    pub fn serialize_q_table(&self) -> String {
        let snapshot = QTableSnapshot {
            dimension_sizes: self.dimension_values.iter().map(Vec::len).collect(),
            action_count: self.action_count,
            q_values: &self.q_table,
        };
        let output = serde_json::to_string_pretty(&snapshot);
        output.unwrap()
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
        // every weight underflowed, the random start is as good as any index
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

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;
    use super::Rng;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum StubAction {
        First,
        Second,
    }

    /// Minimal environment over a 3 x 2 grid with two actions. Terminates
    /// every `steps_per_episode` applied actions and always hands back
    /// `next_state`.
    struct StubEnvironment {
        actions: Vec<StubAction>,
        dimension_values: Vec<Vec<Int>>,
        next_state: StateVector,
        reward: Float,
        terminated: bool,
        steps_per_episode: usize,
        steps_in_episode: usize,
        episodes_started: usize,
        apply_calls: usize,
    }

    impl StubEnvironment {
        fn new() -> Self {
            Self {
                actions: vec![StubAction::First, StubAction::Second],
                dimension_values: vec![vec![0, 1, 2], vec![0, 1]],
                next_state: vec![2, 1],
                reward: 1.0,
                terminated: false,
                steps_per_episode: 3,
                steps_in_episode: 0,
                episodes_started: 0,
                apply_calls: 0,
            }
        }
    }

    impl Environment for StubEnvironment {
        type Action = StubAction;

        fn actions(&self) -> &[StubAction] {
            &self.actions
        }

        fn state_dimension_values(&self) -> &[Vec<Int>] {
            &self.dimension_values
        }

        fn apply_action(&mut self, _action_index: usize) -> (Float, StateVector) {
            self.apply_calls += 1;
            self.steps_in_episode += 1;
            if self.steps_in_episode == self.steps_per_episode {
                self.terminated = true;
            }
            (self.reward, self.next_state.clone())
        }

        fn terminated(&self) -> bool {
            self.terminated
        }

        fn begin_episode(&mut self) {
            self.terminated = false;
            self.steps_in_episode = 0;
            self.episodes_started += 1;
        }
    }

    fn agent_with_strategy(strategy: SelectActionStrategy) -> (QLearningAgent, StubEnvironment) {
        let environment = StubEnvironment::new();
        let config = AgentConfig {
            strategy,
            ..AgentConfig::default()
        };
        let agent = QLearningAgent::new(&environment, config, Rng::seed_from_u64(42));
        (agent, environment)
    }

    #[test]
    fn test_state_index_enumerates_grid_without_collisions() {
        let (agent, environment) = agent_with_strategy(SelectActionStrategy::Greedy);
        let mut seen = vec![false; 6];
        for &first in &environment.dimension_values[0] {
            for &second in &environment.dimension_values[1] {
                let index = agent.state_index(&[first, second]).unwrap();
                assert!(index < 6);
                assert!(!seen[index], "two states mapped to index {}", index);
                seen[index] = true;
            }
        }
        assert!(seen.into_iter().all(|hit| hit));
    }

    #[test]
    fn test_state_index_matches_mixed_radix_layout() {
        let (agent, _) = agent_with_strategy(SelectActionStrategy::Greedy);
        assert_eq!(agent.state_index(&[0, 0]).unwrap(), 0);
        assert_eq!(agent.state_index(&[0, 1]).unwrap(), 1);
        assert_eq!(agent.state_index(&[1, 0]).unwrap(), 2);
        assert_eq!(agent.state_index(&[2, 1]).unwrap(), 5);
    }

    #[test]
    fn test_state_index_rejects_undeclared_value() {
        let (agent, _) = agent_with_strategy(SelectActionStrategy::Greedy);
        let error = agent.state_index(&[0, 7]).unwrap_err();
        assert_eq!(
            error,
            AgentError::StateResolution {
                dimension: 1,
                value: 7
            }
        );
    }

    #[test]
    fn test_update_with_zero_learning_rate_changes_nothing() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::Greedy);
        agent.config.learning_rate = 0.0;
        let before = agent.q_table.clone();
        agent.update_q_value(2, 1, 5.0, 5);
        assert_eq!(agent.q_table, before);
    }

    #[test]
    fn test_update_with_full_learning_rate_replaces_q_value() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::Greedy);
        agent.config.learning_rate = 1.0;
        let max_next = agent.q_table[5]
            .iter()
            .copied()
            .fold(Float::NEG_INFINITY, Float::max);
        agent.update_q_value(2, 1, 3.0, 5);
        assert_abs_diff_eq!(
            agent.q_table[2][1],
            3.0 + agent.config.discount_factor * max_next,
            epsilon = 1e-9
        );
    }

    // The worked 6-state example: zero table, gamma 0.9, alpha 0.1, one
    // update at state (1, 0) with action 1, reward 1, next state (2, 1).
    #[test]
    fn test_single_backup_from_zero_table() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::Softmax);
        agent.config.learning_rate = 0.1;
        agent.config.discount_factor = 0.9;
        let state = agent.state_index(&[1, 0]).unwrap();
        let next = agent.state_index(&[2, 1]).unwrap();
        agent.update_q_value(state, 1, 1.0, next);
        assert_abs_diff_eq!(agent.q_value(state, 1), 0.1);
    }

    #[test]
    fn test_greedy_selection_returns_unique_maximum() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::Greedy);
        agent.q_table[3] = vec![0.2, 0.9];
        assert_eq!(agent.greedy_selection(3), 1);
    }

    #[test]
    fn test_greedy_selection_breaks_ties_towards_lowest_index() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::Greedy);
        agent.q_table[3] = vec![0.7, 0.7];
        assert_eq!(agent.greedy_selection(3), 0);
    }

    #[test]
    fn test_epsilon_zero_behaves_like_greedy() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::EpsilonGreedy);
        agent.config.epsilon = 0.0;
        let expected = agent.greedy_selection(0);
        for _ in 0..100 {
            assert_eq!(agent.select_action(0), expected);
        }
    }

    // With epsilon = 1 every draw is uniform over the action indices. A
    // chi-square statistic over many draws must stay below the critical
    // value for 1 degree of freedom at p = 0.001.
    #[test]
    fn test_epsilon_one_samples_uniformly() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::EpsilonGreedy);
        agent.config.epsilon = 1.0;
        let draws = 10_000;
        let mut counts = vec![0usize; agent.action_count];
        for _ in 0..draws {
            counts[agent.select_action(0)] += 1;
        }
        let expected = draws as Float / agent.action_count as Float;
        let chi_square: Float = counts
            .iter()
            .map(|&observed| {
                let deviation = observed as Float - expected;
                deviation * deviation / expected
            })
            .sum();
        assert!(
            chi_square < 10.83,
            "chi-square {} too large for uniform draws",
            chi_square
        );
    }

    #[test]
    fn test_softmax_over_zero_table_is_uniform() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::Softmax);
        let draws = 10_000;
        let mut counts = vec![0usize; agent.action_count];
        for _ in 0..draws {
            counts[agent.select_action(0)] += 1;
        }
        let expected = draws as Float / agent.action_count as Float;
        for &observed in &counts {
            let deviation = (observed as Float - expected).abs() / expected;
            assert!(deviation < 0.1, "count {} far from uniform", observed);
        }
    }

    #[test]
    fn test_softmax_prefers_heavier_weight() {
        let (mut agent, _) = agent_with_strategy(SelectActionStrategy::Softmax);
        agent.q_table[0] = vec![0.0, 5.0];
        let mut counts = vec![0usize; 2];
        for _ in 0..1_000 {
            counts[agent.select_action(0)] += 1;
        }
        assert!(counts[1] > 900, "heavy action drawn only {} times", counts[1]);
    }

    #[test]
    fn test_unknown_strategy_tag_is_invalid_configuration() {
        let error = SelectActionStrategy::from_str("bogus").unwrap_err();
        assert_eq!(
            error,
            AgentError::InvalidConfiguration("bogus".to_string())
        );
        assert_eq!(
            "e_greedy".parse::<SelectActionStrategy>().unwrap(),
            SelectActionStrategy::EpsilonGreedy
        );
    }

    #[test]
    fn test_state_reaction_with_unresolvable_override_leaves_table_untouched() {
        let (mut agent, mut environment) = agent_with_strategy(SelectActionStrategy::Greedy);
        agent.init_state(&[0, 0]).unwrap();
        let before = agent.q_table.clone();
        let error = agent
            .state_reaction(&mut environment, Some(&[99, 0]))
            .unwrap_err();
        assert_eq!(
            error,
            AgentError::StateResolution {
                dimension: 0,
                value: 99
            }
        );
        assert_eq!(agent.q_table, before);
        assert_eq!(environment.apply_calls, 0);
    }

    #[test]
    fn test_state_reaction_advances_tracked_index() {
        let (mut agent, mut environment) = agent_with_strategy(SelectActionStrategy::Greedy);
        agent.init_state(&[0, 0]).unwrap();
        agent.state_reaction(&mut environment, None).unwrap();
        let expected = agent.state_index(&environment.next_state).unwrap();
        assert_eq!(agent.current_state_index(), expected);
    }

    #[test]
    fn test_learn_without_initial_state_is_an_error() {
        let (mut agent, mut environment) = agent_with_strategy(SelectActionStrategy::Greedy);
        assert_eq!(
            agent.learn(&mut environment).unwrap_err(),
            AgentError::MissingInitialState
        );
    }

    #[test]
    fn test_learn_runs_every_episode_to_termination() {
        let (mut agent, mut environment) = agent_with_strategy(SelectActionStrategy::Greedy);
        agent.config.episodes = 7;
        agent.init_state(&[0, 0]).unwrap();
        agent.learn(&mut environment).unwrap();
        assert_eq!(environment.episodes_started, 7);
        assert_eq!(
            environment.apply_calls,
            7 * environment.steps_per_episode
        );
    }

    #[test]
    fn test_q_table_snapshot_lists_shape() {
        let (agent, _) = agent_with_strategy(SelectActionStrategy::Softmax);
        let snapshot = agent.serialize_q_table();
        assert!(snapshot.contains("\"dimension_sizes\""));
        assert!(snapshot.contains("\"action_count\": 2"));
    }

    /// A random grid of 1..4 dimensions with distinct sorted values, plus
    /// two states picked from it by per-dimension position seeds.
    fn grid_and_two_states(
    ) -> impl Strategy<Value = (Vec<Vec<Int>>, StateVector, StateVector)> {
        let grid = prop::collection::vec(
            prop::collection::hash_set(-50..50_i32, 1..5),
            1..4,
        );
        (
            grid,
            prop::collection::vec(any::<prop::sample::Index>(), 4),
            prop::collection::vec(any::<prop::sample::Index>(), 4),
        )
            .prop_map(|(dimensions, first_seeds, second_seeds)| {
                let dimensions: Vec<Vec<Int>> = dimensions
                    .into_iter()
                    .map(|values| {
                        let mut values: Vec<Int> = values.into_iter().collect();
                        values.sort_unstable();
                        values
                    })
                    .collect();
                let pick = |seeds: &[prop::sample::Index]| {
                    dimensions
                        .iter()
                        .enumerate()
                        .map(|(dimension, values)| values[seeds[dimension].index(values.len())])
                        .collect::<StateVector>()
                };
                let first = pick(&first_seeds);
                let second = pick(&second_seeds);
                (dimensions, first, second)
            })
    }

    proptest! {
        #[test]
        fn test_state_index_is_injective_and_in_range(
            (dimension_values, first, second) in grid_and_two_states()
        ) {
            let mut environment = StubEnvironment::new();
            environment.dimension_values = dimension_values.clone();
            let agent = QLearningAgent::new(
                &environment,
                AgentConfig::default(),
                Rng::seed_from_u64(0),
            );
            let row_count: usize = dimension_values.iter().map(Vec::len).product();
            let first_index = agent.state_index(&first).unwrap();
            let second_index = agent.state_index(&second).unwrap();
            prop_assert!(first_index < row_count);
            prop_assert!(second_index < row_count);
            prop_assert_eq!(first_index == second_index, first == second);
        }
    }
}
