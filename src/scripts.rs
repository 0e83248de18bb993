use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::actions::ActionSet;
use crate::emulator::Wins;
use crate::error::{EnvError, Result};

/// Wait `wait` idle ticks, then hold `actions` for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub wait: u32,
    pub actions: ActionSet,
}

pub type Script = Vec<ScriptStep>;

/// Non-learnable input sequences that walk the game through its menus.
pub trait TransitionScripts {
    fn set_difficulty(&self, frame_ratio: u32, difficulty: u8) -> Script;
    fn start_game(&self, frame_ratio: u32) -> Script;
    /// Sequence run once the continue screen has gone blank. `stage` is the
    /// stage the next game should be fought on.
    fn reset_game(&self, frame_ratio: u32, wins: Wins, stage: u8) -> Script;
}

// =============================================================================
// Script Book (JSON)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyScript {
    pub enter: Script,
    pub default_level: u8,
    pub raise: Script,
    pub lower: Script,
    pub confirm: Script,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetScript {
    /// P1 won and the arcade moves straight on to the next opponent.
    pub advance: Script,
    /// P1 lost, or cleared the final stage: insert a credit and start over.
    pub restart: Script,
}

/// Transition scripts loaded from data. Waits are written in visible frames at
/// frame ratio 1 and scaled down to ticks when a script is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBook {
    pub difficulty: DifficultyScript,
    pub start_game: Script,
    pub reset: ResetScript,
}

const BUILTIN: &str = include_str!("../scripts/sfiii3n.json");

impl ScriptBook {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| EnvError::Script(err.to_string()))
    }

    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| EnvError::Script(format!("failed to read {}: {err}", path.display())))?;
        Self::from_json(&text)
    }
}

fn scaled(script: &[ScriptStep], frame_ratio: u32) -> Script {
    let frame_ratio = frame_ratio.max(1);
    script
        .iter()
        .map(|step| ScriptStep {
            wait: step.wait / frame_ratio,
            actions: step.actions.clone(),
        })
        .collect()
}

impl TransitionScripts for ScriptBook {
    fn set_difficulty(&self, frame_ratio: u32, difficulty: u8) -> Script {
        let d = &self.difficulty;
        let mut script = d.enter.clone();
        let (nudge, presses) = if difficulty >= d.default_level {
            (&d.raise, difficulty - d.default_level)
        } else {
            (&d.lower, d.default_level - difficulty)
        };
        for _ in 0..presses {
            script.extend(nudge.iter().cloned());
        }
        script.extend(d.confirm.iter().cloned());
        scaled(&script, frame_ratio)
    }

    fn start_game(&self, frame_ratio: u32) -> Script {
        scaled(&self.start_game, frame_ratio)
    }

    fn reset_game(&self, frame_ratio: u32, wins: Wins, stage: u8) -> Script {
        if wins.p1 == Wins::TO_WIN_GAME && stage != 1 {
            scaled(&self.reset.advance, frame_ratio)
        } else {
            scaled(&self.reset.restart, frame_ratio)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;

    #[test]
    fn builtin_book_parses() {
        let book = ScriptBook::builtin().unwrap();
        assert!(!book.start_game.is_empty());
        assert!(book.start_game.iter().any(|s| s.actions.contains(&Action::Start)));
    }

    #[test]
    fn waits_scale_with_frame_ratio() {
        let book = ScriptBook::builtin().unwrap();
        let full = book.start_game(1);
        let third = book.start_game(3);
        assert_eq!(full.len(), third.len());
        for (a, b) in full.iter().zip(&third) {
            assert_eq!(a.wait / 3, b.wait);
            assert_eq!(a.actions, b.actions);
        }
    }

    #[test]
    fn difficulty_nudges_from_default() {
        let book = ScriptBook::builtin().unwrap();
        let base = book.set_difficulty(1, book.difficulty.default_level).len();
        let count = |script: &Script, action| {
            script.iter().filter(|s| s.actions == vec![action]).count()
        };
        let harder = book.set_difficulty(1, 6);
        assert_eq!(harder.len(), base + 3);
        assert_eq!(count(&harder, Action::Right), 3);
        let easier = book.set_difficulty(1, 1);
        assert_eq!(easier.len(), base + 2);
        assert_eq!(count(&easier, Action::Left), 2);
    }

    #[test]
    fn reset_picks_sequence_from_result() {
        let book = ScriptBook::builtin().unwrap();
        let won = Wins { p1: 2, p2: 1 };
        let lost = Wins { p1: 0, p2: 2 };
        assert_eq!(book.reset_game(1, won, 4), book.reset.advance);
        assert_eq!(book.reset_game(1, lost, 1), book.reset.restart);
        // Clearing the last stage wraps to 1 and needs a fresh credit.
        assert_eq!(book.reset_game(1, won, 1), book.reset.restart);
    }

    #[test]
    fn malformed_book_is_a_script_error() {
        assert!(matches!(ScriptBook::from_json("{}"), Err(EnvError::Script(_))));
    }
}
