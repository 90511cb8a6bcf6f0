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

//! Trains the Q-learning agent on the paddle/ball game, then evaluates how
//! often the learned policy catches the ball.

use paddle_ball::PaddleBall;
use q_learning::{AgentConfig, Environment, Float, QLearningAgent, Rng, SelectActionStrategy};
use rand::SeedableRng;
use tracing::info;

const EPISODES: usize = 5000;
const LEARNING_RATE: Float = 0.01;
const DISCOUNT_FACTOR: Float = 0.9;
const SELECT_ACTION_STRATEGY: SelectActionStrategy = SelectActionStrategy::EpsilonGreedy;
const EPSILON: Float = 0.1;

const EVALUATION_EPISODES: u32 = 200;
const Q_TABLE_DUMP_PATH: &str = "/tmp/paddle-ball-q-table.json";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut game = PaddleBall::new();
    let config = AgentConfig {
        episodes: EPISODES,
        discount_factor: DISCOUNT_FACTOR,
        learning_rate: LEARNING_RATE,
        strategy: SELECT_ACTION_STRATEGY,
        epsilon: EPSILON,
        ..AgentConfig::default()
    };
    let mut agent = QLearningAgent::new(&game, config, Rng::from_entropy());
    agent.init_state(&game.state())?;

    info!(episodes = EPISODES, "learning");
    game.set_learning(true);
    agent.learn(&mut game)?;
    game.set_learning(false);

    info!(episodes = EVALUATION_EPISODES, "evaluating");
    for _ in 0..EVALUATION_EPISODES {
        game.begin_episode();
        loop {
            let state = game.state();
            agent.state_reaction(&mut game, Some(&state))?;
            if game.terminated() {
                break;
            }
        }
    }

    if let Some(success_rate) = game.success_rate() {
        println!(
            "{}% success rate over {} evaluation episodes",
            (success_rate * 100.0).round(),
            game.evaluated_episodes()
        );
    }

    std::fs::write(Q_TABLE_DUMP_PATH, agent.serialize_q_table())?;
    println!("q-table written to {}", Q_TABLE_DUMP_PATH);
    Ok(())
}
