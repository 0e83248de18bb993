use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::actions::{ATTACK_COUNT, MOVE_COUNT};
use crate::emulator::{EmulatorAdapter, Wins};
use crate::env::{Environment, Phase};
use crate::error::Result;
use crate::scripts::TransitionScripts;

#[derive(Debug, Clone, Default)]
pub struct EvalStats {
    pub games: usize,
    pub rounds: usize,
    pub p1_games_won: usize,
    pub steps: u64,
    pub total_reward: i64,
    pub avg_reward: f64,
    pub final_stage: u8,
}

/// Play `games` complete games with uniformly random actions.
pub fn run_random_baseline<A, S>(
    env: &mut Environment<A, S>,
    games: usize,
    seed: u64,
) -> Result<EvalStats>
where
    A: EmulatorAdapter,
    S: TransitionScripts,
{
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut stats = EvalStats::default();

    if env.phase() == Phase::NotStarted {
        env.start()?;
    }

    while stats.games < games {
        let mut game_reward = 0i64;
        loop {
            let result = env.step(
                rng.random_range(0..MOVE_COUNT),
                rng.random_range(0..ATTACK_COUNT),
            )?;
            stats.steps += 1;
            game_reward += result.rewards.p1 as i64;
            if !result.round_done {
                continue;
            }
            stats.rounds += 1;
            if result.game_done {
                break;
            }
            env.next_round()?;
        }

        let wins = env.state().expected_wins;
        stats.games += 1;
        if wins.p1 == Wins::TO_WIN_GAME {
            stats.p1_games_won += 1;
        }
        stats.total_reward += game_reward;
        info!(
            game = stats.games,
            wins = %wins,
            stage = env.state().stage,
            reward = game_reward,
            "random game finished"
        );
        if stats.games < games {
            env.next_game()?;
        }
    }

    stats.avg_reward = stats.total_reward as f64 / stats.games.max(1) as f64;
    stats.final_stage = env.state().stage;
    Ok(stats)
}
