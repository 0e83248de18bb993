use anyhow::Result;
use std::fmt;

use crate::actions::ActionSet;

// =============================================================================
// Memory Map (sfiii3n)
// =============================================================================

pub mod ram {
    /// How the driver should decode a watched address.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Kind {
        U8,
        S8,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Address {
        pub name: &'static str,
        pub addr: u32,
        pub kind: Kind,
    }

    pub const FIGHTING: Address = Address { name: "fighting", addr: 0x0200_EE44, kind: Kind::U8 };
    pub const WINS_P1: Address = Address { name: "winsP1", addr: 0x0201_1383, kind: Kind::U8 };
    pub const WINS_P2: Address = Address { name: "winsP2", addr: 0x0201_1385, kind: Kind::U8 };
    pub const HEALTH_P1: Address = Address { name: "healthP1", addr: 0x0206_8D0B, kind: Kind::S8 };
    pub const HEALTH_P2: Address = Address { name: "healthP2", addr: 0x0206_91A3, kind: Kind::S8 };

    /// Every address an adapter has to sample each tick.
    pub const WATCHED: [Address; 5] = [FIGHTING, WINS_P1, WINS_P2, HEALTH_P1, HEALTH_P2];
}

// =============================================================================
// Observation
// =============================================================================

/// One captured screen, row-major, `channels` bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize, channels: usize, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width * height * channels);
        Self { width, height, channels, pixels }
    }

    pub fn filled(width: usize, height: usize, channels: usize, value: u8) -> Self {
        Self::new(width, height, channels, vec![value; width * height * channels])
    }

    /// The game blanks the screen completely once the continue countdown ends.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Health {
    pub p1: i8,
    pub p2: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Wins {
    pub p1: u8,
    pub p2: u8,
}

impl Wins {
    pub const TO_WIN_GAME: u8 = 2;

    pub fn game_decided(&self) -> bool {
        self.p1 == Self::TO_WIN_GAME || self.p2 == Self::TO_WIN_GAME
    }
}

impl fmt::Display for Wins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{P1: {}, P2: {}}}", self.p1, self.p2)
    }
}

/// What the emulator reports after a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observation {
    pub frame: Frame,
    pub fighting: bool,
    pub health: Health,
    pub wins: Wins,
}

// =============================================================================
// Adapter
// =============================================================================

/// Flags forwarded to whatever drives the emulator process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterOptions {
    pub frame_ratio: u32,
    pub render: bool,
    pub throttle: bool,
    pub debug: bool,
}

/// The low-level emulator driver. Each `step` advances exactly one tick while
/// holding every action in `actions`; an empty set means no input.
pub trait EmulatorAdapter {
    fn step(&mut self, actions: &ActionSet) -> Result<Observation>;

    /// Release the emulator process or connection.
    fn close(&mut self) -> Result<()>;
}

impl<A: EmulatorAdapter + ?Sized> EmulatorAdapter for Box<A> {
    fn step(&mut self, actions: &ActionSet) -> Result<Observation> {
        (**self).step(actions)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
