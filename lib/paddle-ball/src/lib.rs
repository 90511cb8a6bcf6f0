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

//! Toy paddle/ball game used to train and evaluate the Q-learning agent.
//!
//! The ball moves diagonally on a small integer grid and bounces off the
//! side and top walls. The 3-wide bat moves along the bottom line. An
//! episode ends when the ball reaches the bottom: reward +1 if the bat
//! covers it, -1 otherwise. Rendering is not this crate's business; the
//! environment is pure game mechanics behind the agent's trait.

use q_learning::{Environment, Float, Int, StateVector};
use serde::{Deserialize, Serialize};

const BALL_X_MIN: Int = 1;
const BALL_X_MAX: Int = 10;
const BALL_Y_MIN: Int = 1;
const BALL_Y_MAX: Int = 11;
const BAT_X_MIN: Int = 0;
const BAT_X_MAX: Int = 9;
const BAT_WIDTH: Int = 3;

/// Ways of moving the bat, in Q-table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatAction {
    Left,
    Stay,
    Right,
}

pub struct PaddleBall {
    ball_x: Int,
    ball_y: Int,
    bat_x: Int,
    x_velocity: Int,
    y_velocity: Int,
    terminated: bool,
    learning: bool,
    positive_rewards: u32,
    total_rewards: u32,
    actions: Vec<BatAction>,
    dimension_values: Vec<Vec<Int>>,
}

impl Default for PaddleBall {
    fn default() -> Self {
        PaddleBall::new()
    }
}

impl PaddleBall {
    pub fn new() -> Self {
        Self {
            ball_x: 5,
            ball_y: 6,
            bat_x: 5,
            x_velocity: 1,
            y_velocity: 1,
            terminated: false,
            learning: false,
            positive_rewards: 0,
            total_rewards: 0,
            actions: vec![BatAction::Left, BatAction::Stay, BatAction::Right],
            dimension_values: vec![
                (BALL_X_MIN..=BALL_X_MAX).collect(),
                (BALL_Y_MIN..=BALL_Y_MAX).collect(),
                (BAT_X_MIN..=BAT_X_MAX).collect(),
                vec![-1, 1],
                vec![-1, 1],
            ],
        }
    }

    /// Current state vector: (ball x, ball y, bat x, x velocity, y velocity).
    pub fn state(&self) -> StateVector {
        vec![
            self.ball_x,
            self.ball_y,
            self.bat_x,
            self.x_velocity,
            self.y_velocity,
        ]
    }

    /// While learning, terminal rewards are not counted into the success
    /// statistics.
    pub fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
    }

    /// Share of evaluation episodes the bat caught the ball, if any episode
    /// has finished outside learning mode.
    pub fn success_rate(&self) -> Option<Float> {
        if self.total_rewards == 0 {
            return None;
        }
        Some(Float::from(self.positive_rewards) / Float::from(self.total_rewards))
    }

    pub fn evaluated_episodes(&self) -> u32 {
        self.total_rewards
    }
}

impl Environment for PaddleBall {
    type Action = BatAction;

    fn actions(&self) -> &[BatAction] {
        &self.actions
    }

    fn state_dimension_values(&self) -> &[Vec<Int>] {
        &self.dimension_values
    }

    fn apply_action(&mut self, action_index: usize) -> (Float, StateVector) {
        match self.actions[action_index] {
            BatAction::Left => self.bat_x -= 1,
            BatAction::Stay => {}
            BatAction::Right => self.bat_x += 1,
        }
        // don't allow the bat to leave the pitch
        self.bat_x = self.bat_x.clamp(BAT_X_MIN, BAT_X_MAX);

        self.ball_x += self.x_velocity;
        self.ball_y += self.y_velocity;

        // change direction of the ball at a wall
        if self.ball_x > BALL_X_MAX || self.ball_x < BALL_X_MIN {
            self.x_velocity = -self.x_velocity;
        }
        if self.ball_y > BALL_Y_MAX || self.ball_y < BALL_Y_MIN {
            self.y_velocity = -self.y_velocity;
        }

        let reward = if self.ball_y == 0 {
            self.terminated = true;
            let caught =
                self.bat_x <= self.ball_x && self.bat_x >= self.ball_x - (BAT_WIDTH - 1);
            if !self.learning {
                self.total_rewards += 1;
                if caught {
                    self.positive_rewards += 1;
                }
            }
            if caught {
                1.0
            } else {
                -1.0
            }
        } else {
            0.0
        };

        // snap the ball back into the grid so the returned state resolves
        self.ball_x = self.ball_x.clamp(BALL_X_MIN, BALL_X_MAX);
        self.ball_y = self.ball_y.clamp(BALL_Y_MIN, BALL_Y_MAX);

        (reward, self.state())
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    /// Only the termination flag resets; ball and bat positions carry over
    /// from wherever the previous episode ended.
    fn begin_episode(&mut self) {
        self.terminated = false;
    }
}

#[cfg(test)]
mod tests {
    use q_learning::{AgentConfig, QLearningAgent, Rng, SelectActionStrategy};
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_initial_state_vector() {
        let game = PaddleBall::new();
        assert_eq!(game.state(), vec![5, 6, 5, 1, 1]);
    }

    #[test]
    fn test_actions_move_the_bat() {
        let mut game = PaddleBall::new();
        game.apply_action(0);
        assert_eq!(game.bat_x, 4);
        game.apply_action(2);
        game.apply_action(2);
        assert_eq!(game.bat_x, 6);
        let bat_before = game.bat_x;
        game.apply_action(1);
        assert_eq!(game.bat_x, bat_before);
    }

    #[test]
    fn test_bat_cannot_leave_the_pitch() {
        let mut game = PaddleBall::new();
        game.bat_x = BAT_X_MIN;
        game.apply_action(0);
        assert_eq!(game.bat_x, BAT_X_MIN);
        game.bat_x = BAT_X_MAX;
        game.apply_action(2);
        assert_eq!(game.bat_x, BAT_X_MAX);
    }

    #[test]
    fn test_ball_bounces_off_side_wall() {
        let mut game = PaddleBall::new();
        game.ball_x = BALL_X_MAX;
        game.x_velocity = 1;
        game.apply_action(1);
        assert_eq!(game.x_velocity, -1);
        assert_eq!(game.ball_x, BALL_X_MAX);
    }

    #[test]
    fn test_ball_bounces_off_top_wall() {
        let mut game = PaddleBall::new();
        game.ball_y = BALL_Y_MAX;
        game.y_velocity = 1;
        game.apply_action(1);
        assert_eq!(game.y_velocity, -1);
        assert_eq!(game.ball_y, BALL_Y_MAX);
    }

    #[test]
    fn test_bottom_line_terminates_with_positive_reward_when_caught() {
        let mut game = PaddleBall::new();
        game.ball_x = 5;
        game.ball_y = 1;
        game.y_velocity = -1;
        game.bat_x = 4;
        let (reward, state) = game.apply_action(1);
        assert!(game.terminated());
        assert_eq!(reward, 1.0);
        // ball snapped back onto the grid
        assert_eq!(state[1], BALL_Y_MIN);
    }

    #[test]
    fn test_bottom_line_terminates_with_negative_reward_when_missed() {
        let mut game = PaddleBall::new();
        game.ball_x = 5;
        game.ball_y = 1;
        game.y_velocity = -1;
        game.bat_x = 9;
        let (reward, _) = game.apply_action(1);
        assert!(game.terminated());
        assert_eq!(reward, -1.0);
    }

    #[test]
    fn test_mid_air_steps_pay_no_reward() {
        let mut game = PaddleBall::new();
        let (reward, _) = game.apply_action(1);
        assert_eq!(reward, 0.0);
        assert!(!game.terminated());
    }

    #[test]
    fn test_begin_episode_clears_flag_but_keeps_positions() {
        let mut game = PaddleBall::new();
        game.ball_y = 1;
        game.y_velocity = -1;
        game.apply_action(1);
        assert!(game.terminated());
        let state = game.state();
        game.begin_episode();
        assert!(!game.terminated());
        assert_eq!(game.state(), state);
    }

    #[test]
    fn test_success_counters_only_outside_learning() {
        let mut game = PaddleBall::new();
        game.set_learning(true);
        game.ball_y = 1;
        game.y_velocity = -1;
        game.apply_action(1);
        assert_eq!(game.success_rate(), None);

        game.begin_episode();
        game.set_learning(false);
        game.ball_x = 5;
        game.ball_y = 1;
        game.y_velocity = -1;
        game.bat_x = 5;
        game.apply_action(1);
        assert_eq!(game.evaluated_episodes(), 1);
        assert_eq!(game.success_rate(), Some(1.0));
    }

    // Every state the game hands back must resolve against the declared
    // grid; a short learning run covers bounces, clamping and termination.
    #[test]
    fn test_agent_learns_without_resolution_errors() {
        let mut game = PaddleBall::new();
        game.set_learning(true);
        let config = AgentConfig {
            episodes: 3,
            strategy: SelectActionStrategy::EpsilonGreedy,
            ..AgentConfig::default()
        };
        let mut agent = QLearningAgent::new(&game, config, Rng::seed_from_u64(7));
        agent.init_state(&game.state()).unwrap();
        agent.learn(&mut game).unwrap();
    }
}
