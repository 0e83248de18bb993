use tracing::{Level, debug, event, info, trace, warn};

use crate::actions::{ActionSet, action_set};
use crate::config::EnvConfig;
use crate::emulator::{EmulatorAdapter, Frame, Health, Observation, Wins};
use crate::error::{EnvError, Result};
use crate::reward::{RewardModel, Rewards};
use crate::scripts::{Script, TransitionScripts};

pub const MAX_STAGE: u8 = 10;

// =============================================================================
// Episode State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Fighting,
    /// Round resolved, waiting for `next_round`.
    RoundOver,
    /// A player reached two wins, waiting for `next_round` / `next_game`.
    GameOver,
    Closed,
}

/// All bookkeeping the state machine mutates, owned by one environment.
#[derive(Debug, Clone)]
pub struct EnvState {
    pub phase: Phase,
    pub reward: RewardModel,
    pub expected_wins: Wins,
    pub stage: u8,
    pub round_steps: u64,
    pub games: u64,
    pub game_reward: Rewards,
}

impl Default for EnvState {
    fn default() -> Self {
        Self {
            phase: Phase::NotStarted,
            reward: RewardModel::default(),
            expected_wins: Wins::default(),
            stage: 1,
            round_steps: 0,
            games: 0,
            game_reward: Rewards::default(),
        }
    }
}

impl EnvState {
    pub fn started(&self) -> bool {
        !matches!(self.phase, Phase::NotStarted | Phase::Closed)
    }

    pub fn round_done(&self) -> bool {
        matches!(self.phase, Phase::RoundOver | Phase::GameOver)
    }

    pub fn game_done(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn expected_health(&self) -> Health {
        self.reward.expected()
    }
}

/// Stage for the next game: P1 advances (wrapping after the last stage),
/// P2 sends the run back to the first stage.
/// Any tally other than exactly one player on two wins is inconsistent.
pub fn next_stage(stage: u8, wins: Wins) -> Result<u8> {
    const WON: u8 = Wins::TO_WIN_GAME;
    match (wins.p1, wins.p2) {
        (WON, p2) if p2 < WON => Ok(if stage >= MAX_STAGE { 1 } else { stage + 1 }),
        (p1, WON) if p1 < WON => Ok(1),
        _ => Err(EnvError::Consistency(wins)),
    }
}

// =============================================================================
// Step Results
// =============================================================================

/// Frames handed to the agent for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frames {
    Single(Frame),
    /// Oldest first.
    Stack(Vec<Frame>),
}

impl Frames {
    pub fn len(&self) -> usize {
        match self {
            Frames::Single(_) => 1,
            Frames::Stack(frames) => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[Frame] {
        match self {
            Frames::Single(frame) => std::slice::from_ref(frame),
            Frames::Stack(frames) => frames,
        }
    }

}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub frames: Frames,
    pub rewards: Rewards,
    pub round_done: bool,
    pub game_done: bool,
}

/// Several ticks folded into one: every frame, summed reward, and the
/// emulator state from the last tick.
#[derive(Debug)]
struct Gathered {
    frames: Frames,
    fighting: bool,
    wins: Wins,
    rewards: Rewards,
}

// =============================================================================
// Street Fighter Environment
// =============================================================================

pub struct Environment<A: EmulatorAdapter, S: TransitionScripts> {
    adapter: A,
    scripts: S,
    config: EnvConfig,
    state: EnvState,
}

impl<A: EmulatorAdapter, S: TransitionScripts> Environment<A, S> {
    pub fn new(adapter: A, scripts: S, config: EnvConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            adapter,
            scripts,
            config,
            state: EnvState::default(),
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn state(&self) -> &EnvState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    fn log_state(&self, tag: &str) {
        let s = &self.state;
        macro_rules! emit {
            ($lvl:ident) => {
                event!(
                    Level::$lvl,
                    tag,
                    phase = ?s.phase,
                    stage = s.stage,
                    wins = %s.expected_wins,
                    health = ?s.expected_health(),
                    round_steps = s.round_steps,
                    games = s.games,
                    "state"
                )
            };
        }
        // Levels have to be constants at the callsite.
        if self.config.debug {
            emit!(INFO);
        } else {
            emit!(DEBUG);
        }
    }

    /// One emulator tick. Every tick goes through here so the reward baseline
    /// always matches the last observation consumed.
    fn tick(&mut self, actions: &ActionSet) -> Result<(Observation, Rewards)> {
        let obs = self.adapter.step(actions)?;
        let rewards = self.state.reward.observe(obs.health);
        trace!(
            fighting = obs.fighting,
            p1 = obs.health.p1,
            p2 = obs.health.p2,
            wins = %obs.wins,
            "tick"
        );
        Ok((obs, rewards))
    }

    fn idle(&mut self, ticks: u32) -> Result<()> {
        let none = ActionSet::new();
        for _ in 0..ticks {
            self.tick(&none)?;
        }
        Ok(())
    }

    fn run_script(&mut self, name: &str, script: &Script) -> Result<()> {
        debug!(script = name, steps = script.len(), "running transition script");
        for step in script {
            self.idle(step.wait)?;
            self.tick(&step.actions)?;
        }
        Ok(())
    }

    /// Hold `actions` for `frames_per_step` ticks and bundle the result.
    fn gather_frames(&mut self, actions: &ActionSet) -> Result<Gathered> {
        let n = self.config.frames_per_step;
        let mut frames = Vec::with_capacity(n);
        let mut rewards = Rewards::default();
        let mut fighting = false;
        let mut wins = Wins::default();
        for _ in 0..n {
            let (obs, r) = self.tick(actions)?;
            rewards += r;
            fighting = obs.fighting;
            wins = obs.wins;
            frames.push(obs.frame);
        }
        let frames = match frames.len() {
            1 => Frames::Single(frames.swap_remove(0)),
            _ => Frames::Stack(frames),
        };
        Ok(Gathered {
            frames,
            fighting,
            wins,
            rewards,
        })
    }

    fn wait_for_fight_start(&mut self, is_new_game: bool) -> Result<Frames> {
        let delay = if is_new_game {
            self.config.settle_delay_ticks()
        } else {
            0
        };
        let none = ActionSet::new();
        let mut obs = self.tick(&none)?.0;
        while !obs.fighting {
            obs = self.tick(&none)?.0;
        }
        for _ in 0..delay {
            obs = self.tick(&none)?.0;
        }
        self.state.reward.reset(obs.health);

        let gathered = self.gather_frames(&none)?;
        self.state.phase = Phase::Fighting;
        self.state.round_steps = 0;
        self.log_state("fight-start");
        Ok(gathered.frames)
    }

    /// Drive the game from power-on to the first controllable frames.
    pub fn start(&mut self) -> Result<Frames> {
        match self.state.phase {
            Phase::NotStarted => {}
            Phase::Closed => return Err(EnvError::CallOrder("environment is closed")),
            _ => return Err(EnvError::CallOrder("start called more than once")),
        }
        if self.config.throttle {
            self.idle(self.config.throttle_ticks())?;
        }
        let difficulty = self
            .scripts
            .set_difficulty(self.config.frame_ratio, self.config.difficulty);
        self.run_script("set-difficulty", &difficulty)?;
        let start = self.scripts.start_game(self.config.frame_ratio);
        self.run_script("start-game", &start)?;
        self.wait_for_fight_start(true)
    }

    pub fn step(&mut self, move_index: usize, attack_index: usize) -> Result<StepOutcome> {
        match self.state.phase {
            Phase::Fighting => {}
            Phase::NotStarted => {
                return Err(EnvError::CallOrder("start must be called before stepping"));
            }
            Phase::RoundOver | Phase::GameOver => {
                return Err(EnvError::CallOrder(
                    "attempted to step while characters are not fighting",
                ));
            }
            Phase::Closed => return Err(EnvError::CallOrder("environment is closed")),
        }
        let actions = action_set(move_index, attack_index)?;
        let gathered = self.gather_frames(&actions)?;
        self.state.round_steps += 1;
        let gathered = self.check_done(gathered)?;
        self.state.game_reward += gathered.rewards;

        Ok(StepOutcome {
            frames: gathered.frames,
            rewards: gathered.rewards,
            round_done: self.state.round_done(),
            game_done: self.state.game_done(),
        })
    }

    fn check_done(&mut self, gathered: Gathered) -> Result<Gathered> {
        if gathered.fighting {
            return Ok(gathered);
        }
        let gathered = self.run_till_victor(gathered)?;
        self.state.expected_wins = gathered.wins;
        self.state.phase = if gathered.wins.game_decided() {
            Phase::GameOver
        } else {
            Phase::RoundOver
        };
        self.log_state("round-over");
        Ok(gathered)
    }

    /// The fight flag drops before the win tally updates; keep the clock
    /// running until the tally moves.
    fn run_till_victor(&mut self, mut gathered: Gathered) -> Result<Gathered> {
        let none = ActionSet::new();
        while gathered.wins == self.state.expected_wins {
            let next = self.gather_frames(&none)?;
            gathered = Gathered {
                rewards: gathered.rewards + next.rewards,
                ..next
            };
        }
        Ok(gathered)
    }

    pub fn next_round(&mut self) -> Result<Frames> {
        match self.state.phase {
            Phase::GameOver => self.next_game(),
            Phase::RoundOver => self.wait_for_fight_start(false),
            Phase::NotStarted => Err(EnvError::CallOrder("start must be called before next_round")),
            Phase::Fighting => Err(EnvError::CallOrder("next_round called while the round is live")),
            Phase::Closed => Err(EnvError::CallOrder("environment is closed")),
        }
    }

    pub fn next_game(&mut self) -> Result<Frames> {
        match self.state.phase {
            Phase::GameOver => {}
            Phase::Closed => return Err(EnvError::CallOrder("environment is closed")),
            _ => return Err(EnvError::CallOrder("next_game called before the game finished")),
        }
        let wins = self.wait_for_continue()?;
        let stage = next_stage(self.state.stage, wins)?;
        info!(
            game = self.state.games + 1,
            wins = %wins,
            stage_played = self.state.stage,
            next_stage = stage,
            p1_reward = self.state.game_reward.p1,
            "game finished"
        );
        self.state.stage = stage;

        let reset = self.scripts.reset_game(self.config.frame_ratio, wins, stage);
        self.run_script("reset-game", &reset)?;

        self.state.expected_wins = Wins::default();
        self.state.games += 1;
        self.state.game_reward = Rewards::default();
        self.wait_for_fight_start(true)
    }

    /// Idle until the continue screen blanks out; the tally on that tick is final.
    fn wait_for_continue(&mut self) -> Result<Wins> {
        let none = ActionSet::new();
        let mut obs = self.tick(&none)?.0;
        while !obs.frame.is_blank() {
            obs = self.tick(&none)?.0;
        }
        Ok(obs.wins)
    }

    /// Release the emulator. Only the first call reaches the adapter.
    pub fn close(&mut self) -> Result<()> {
        if self.state.phase == Phase::Closed {
            debug!("close called on a closed environment");
            return Ok(());
        }
        self.state.phase = Phase::Closed;
        self.adapter.close()?;
        Ok(())
    }
}

impl<A: EmulatorAdapter, S: TransitionScripts> Drop for Environment<A, S> {
    fn drop(&mut self) {
        if self.state.phase != Phase::Closed {
            self.state.phase = Phase::Closed;
            if let Err(err) = self.adapter.close() {
                warn!("failed to close emulator on drop: {err:#}");
            }
        }
    }
}
