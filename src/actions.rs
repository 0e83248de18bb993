use crate::error::{EnvError, Result};

// =============================================================================
// Low-level Inputs
// =============================================================================

/// One player-1 input the emulator can hold down for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum Action {
    Left = 0,
    Right = 1,
    Up = 2,
    Down = 3,
    Jab = 4,
    Strong = 5,
    Fierce = 6,
    Short = 7,
    Forward = 8,
    Roundhouse = 9,
    Coin = 10,
    Start = 11,
}

impl Action {
    /// Input port the emulator driver binds this action to.
    pub fn port(self) -> &'static str {
        match self {
            Action::Left => "P1_LEFT",
            Action::Right => "P1_RIGHT",
            Action::Up => "P1_UP",
            Action::Down => "P1_DOWN",
            Action::Jab => "P1_JPUNCH",
            Action::Strong => "P1_SPUNCH",
            Action::Fierce => "P1_FPUNCH",
            Action::Short => "P1_SKICK",
            Action::Forward => "P1_FKICK",
            Action::Roundhouse => "P1_RKICK",
            Action::Coin => "COIN_P1",
            Action::Start => "START_P1",
        }
    }
}

/// Ordered set of inputs held together for one tick. Empty means no input.
pub type ActionSet = Vec<Action>;

// =============================================================================
// Discrete Action Space
// =============================================================================

use Action::*;

pub const MOVE_COUNT: usize = 9;
pub const ATTACK_COUNT: usize = 10;

/// Directional inputs by move index. The last entry is neutral.
pub const MOVES: [&[Action]; MOVE_COUNT] = [
    &[Left],
    &[Left, Up],
    &[Up],
    &[Up, Right],
    &[Right],
    &[Right, Down],
    &[Down],
    &[Down, Left],
    &[],
];

/// Button inputs by attack index. The last entry is neutral.
pub const ATTACKS: [&[Action]; ATTACK_COUNT] = [
    &[Jab],
    &[Strong],
    &[Fierce],
    &[Jab, Strong],
    &[Short],
    &[Forward],
    &[Roundhouse],
    &[Short, Forward],
    &[Jab, Short],
    &[],
];

pub const NEUTRAL_MOVE: usize = MOVE_COUNT - 1;
pub const NEUTRAL_ATTACK: usize = ATTACK_COUNT - 1;

pub fn index_to_move(index: usize) -> Result<&'static [Action]> {
    MOVES.get(index).copied().ok_or(EnvError::Index {
        table: "move",
        index,
        len: MOVE_COUNT,
    })
}

pub fn index_to_attack(index: usize) -> Result<&'static [Action]> {
    ATTACKS.get(index).copied().ok_or(EnvError::Index {
        table: "attack",
        index,
        len: ATTACK_COUNT,
    })
}

/// Combined action set for one agent decision, directions first.
pub fn action_set(move_index: usize, attack_index: usize) -> Result<ActionSet> {
    let moves = index_to_move(move_index)?;
    let attacks = index_to_attack(attack_index)?;
    Ok(moves.iter().chain(attacks).copied().collect())
}
