pub mod actions;
pub mod config;
pub mod emulator;
pub mod env;
pub mod error;
pub mod eval;
pub mod reward;
pub mod scripts;
pub mod sim;

pub use actions::{Action, ActionSet, action_set, index_to_attack, index_to_move};
pub use config::EnvConfig;
pub use emulator::{AdapterOptions, EmulatorAdapter, Frame, Health, Observation, Wins, ram};
pub use env::{EnvState, Environment, Frames, Phase, StepOutcome, next_stage};
pub use error::{EnvError, Result};
pub use eval::{EvalStats, run_random_baseline};
pub use reward::{RewardModel, Rewards};
pub use scripts::{Script, ScriptBook, ScriptStep, TransitionScripts};
pub use sim::{SimConfig, SimulatedArcade};
