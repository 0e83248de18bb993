use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::actions::{Action, ActionSet};
use crate::emulator::{AdapterOptions, EmulatorAdapter, Frame, Health, Observation, Wins};
use crate::scripts::{ScriptBook, TransitionScripts};

// =============================================================================
// Simulation Knobs
// =============================================================================

/// Timings are in visible frames and get divided by the frame ratio.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Start presses needed after power-on before the first round begins.
    pub boot_starts: u32,
    /// Has to outlast whatever a script still presses after its last Start.
    pub intro_frames: u32,
    pub tally_delay_frames: u32,
    pub continue_frames: u32,
    pub round_frames: u32,
    pub max_health: i8,
    pub hit_rate: f64,
    /// Extra chance the hit lands on P2 while P1 is pressing a button.
    pub attack_edge: f64,
    pub max_damage: i8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            boot_starts: 3,
            intro_frames: 600,
            tally_delay_frames: 90,
            continue_frames: 300,
            round_frames: 99 * 60,
            max_health: 120,
            hit_rate: 0.1,
            attack_edge: 0.15,
            max_damage: 10,
        }
    }
}

impl SimConfig {
    /// Boot after the last Start in the difficulty and game-start scripts.
    pub fn for_book(book: &ScriptBook, difficulty: u8) -> Self {
        let starts = book
            .set_difficulty(1, difficulty)
            .iter()
            .chain(book.start_game(1).iter())
            .filter(|step| step.actions.contains(&Action::Start))
            .count() as u32;
        Self {
            boot_starts: starts.max(1),
            ..Default::default()
        }
    }

    /// Pull knobs back into the range the damage roll can use.
    fn sanitized(self) -> Self {
        Self {
            max_health: self.max_health.max(1),
            hit_rate: probability(self.hit_rate),
            attack_edge: if self.attack_edge.is_nan() { 0.0 } else { self.attack_edge },
            max_damage: self.max_damage.max(1),
            ..self
        }
    }
}

/// NaN counts as never.
fn probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Attract { starts: u32 },
    Intro { left: u32 },
    Fight { left: u32 },
    Tally { left: u32, p1_won: bool },
    Continue { left: u32 },
    Blank,
}

const WIDTH: usize = 8;
const HEIGHT: usize = 6;

// =============================================================================
// Simulated Arcade
// =============================================================================

/// Stand-in for the real emulator: reproduces the signal shape the
/// environment relies on (fight flag drops before the tally moves, the
/// continue screen blanks once) with seeded random damage.
pub struct SimulatedArcade {
    options: AdapterOptions,
    config: SimConfig,
    rng: SmallRng,
    screen: Screen,
    health: Health,
    wins: Wins,
    ticks: u64,
    booted: bool,
    closed: bool,
}

impl SimulatedArcade {
    pub fn new(options: AdapterOptions, config: SimConfig, seed: u64) -> Self {
        let config = config.sanitized();
        Self {
            options,
            screen: Screen::Attract { starts: 0 },
            health: Health { p1: config.max_health, p2: config.max_health },
            config,
            rng: SmallRng::seed_from_u64(seed),
            wins: Wins::default(),
            ticks: 0,
            booted: false,
            closed: false,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn scaled(&self, frames: u32) -> u32 {
        (frames / self.options.frame_ratio.max(1)).max(1)
    }

    fn frame(&self) -> Frame {
        match self.screen {
            Screen::Blank => Frame::filled(WIDTH, HEIGHT, 1, 0),
            Screen::Fight { .. } => {
                let mut frame = Frame::filled(WIDTH, HEIGHT, 1, 64);
                frame.pixels[0] = self.health.p1.max(1) as u8;
                frame.pixels[WIDTH - 1] = self.health.p2.max(1) as u8;
                frame
            }
            _ => Frame::filled(WIDTH, HEIGHT, 1, 32),
        }
    }

    fn exchange_blows(&mut self, actions: &ActionSet) {
        if !self.rng.random_bool(self.config.hit_rate) {
            return;
        }
        let attacking = actions
            .iter()
            .any(|a| !matches!(a, Action::Left | Action::Right | Action::Up | Action::Down));
        let p2_hit = if attacking {
            probability(0.5 + self.config.attack_edge)
        } else {
            0.5
        };
        let damage = self.rng.random_range(1..=self.config.max_damage);
        if self.rng.random_bool(p2_hit) {
            self.health.p2 = self.health.p2.saturating_sub(damage).max(0);
        } else {
            self.health.p1 = self.health.p1.saturating_sub(damage).max(0);
        }
    }

    fn advance(&mut self, actions: &ActionSet) {
        let pressed_start = actions.contains(&Action::Start);
        let screen = self.screen;
        self.screen = match screen {
            Screen::Attract { starts } => {
                let starts = starts + pressed_start as u32;
                let needed = if self.booted { 1 } else { self.config.boot_starts };
                if starts >= needed {
                    Screen::Intro { left: self.scaled(self.config.intro_frames) }
                } else {
                    Screen::Attract { starts }
                }
            }
            Screen::Intro { left } if left > 1 => Screen::Intro { left: left - 1 },
            Screen::Intro { .. } => {
                self.health = Health { p1: self.config.max_health, p2: self.config.max_health };
                Screen::Fight { left: self.scaled(self.config.round_frames) }
            }
            Screen::Fight { left } => {
                self.exchange_blows(actions);
                let (p1, p2) = (self.health.p1, self.health.p2);
                if p1 == 0 || p2 == 0 || left <= 1 {
                    // Time over with equal health goes to the CPU.
                    Screen::Tally {
                        left: self.scaled(self.config.tally_delay_frames),
                        p1_won: p2 == 0 || (p1 != 0 && p1 > p2),
                    }
                } else {
                    Screen::Fight { left: left - 1 }
                }
            }
            Screen::Tally { left, p1_won } if left > 1 => Screen::Tally { left: left - 1, p1_won },
            Screen::Tally { p1_won, .. } => {
                if p1_won {
                    self.wins.p1 += 1;
                } else {
                    self.wins.p2 += 1;
                }
                if self.wins.game_decided() {
                    Screen::Continue { left: self.scaled(self.config.continue_frames) }
                } else {
                    Screen::Intro { left: self.scaled(self.config.intro_frames) }
                }
            }
            Screen::Continue { left } if left > 1 => Screen::Continue { left: left - 1 },
            Screen::Continue { .. } => Screen::Blank,
            Screen::Blank => {
                self.wins = Wins::default();
                self.booted = true;
                Screen::Attract { starts: 0 }
            }
        };
    }
}

impl EmulatorAdapter for SimulatedArcade {
    fn step(&mut self, actions: &ActionSet) -> Result<Observation> {
        if self.closed {
            anyhow::bail!("simulated arcade is closed");
        }
        self.advance(actions);
        self.ticks += 1;
        let obs = Observation {
            frame: self.frame(),
            fighting: matches!(self.screen, Screen::Fight { .. }),
            health: self.health,
            wins: self.wins,
        };
        if self.options.debug {
            trace!(tick = self.ticks, screen = ?self.screen, wins = %self.wins, "sim");
        }
        Ok(obs)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arcade(seed: u64) -> SimulatedArcade {
        let options = AdapterOptions { frame_ratio: 3, ..Default::default() };
        let config = SimConfig { boot_starts: 2, ..Default::default() };
        SimulatedArcade::new(options, config, seed)
    }

    fn boot(sim: &mut SimulatedArcade) {
        sim.step(&vec![Action::Start]).unwrap();
        sim.step(&vec![Action::Start]).unwrap();
    }

    #[test]
    fn stays_in_attract_until_enough_starts() {
        let mut sim = arcade(1);
        for _ in 0..50 {
            assert!(!sim.step(&vec![Action::Coin]).unwrap().fighting);
        }
        sim.step(&vec![Action::Start]).unwrap();
        for _ in 0..500 {
            assert!(!sim.step(&vec![]).unwrap().fighting);
        }
        sim.step(&vec![Action::Start]).unwrap();
        let mut ticks = 0;
        while !sim.step(&vec![]).unwrap().fighting {
            ticks += 1;
        }
        assert_eq!(ticks, 600 / 3 - 1);
    }

    #[test]
    fn tally_moves_after_fight_flag_drops() {
        let mut sim = arcade(7);
        boot(&mut sim);
        let mut obs = sim.step(&vec![]).unwrap();
        while !obs.fighting {
            obs = sim.step(&vec![]).unwrap();
        }
        while obs.fighting {
            obs = sim.step(&vec![Action::Fierce]).unwrap();
        }
        assert_eq!(obs.wins, Wins::default());
        let mut lag = 0;
        while obs.wins == Wins::default() {
            assert!(!obs.fighting);
            obs = sim.step(&vec![]).unwrap();
            lag += 1;
        }
        assert_eq!(lag, 90 / 3);
        assert_eq!(obs.wins.p1 + obs.wins.p2, 1);
    }

    #[test]
    fn decided_game_blanks_exactly_once() {
        let mut sim = arcade(3);
        boot(&mut sim);
        let mut blanks = Vec::new();
        for _ in 0..200_000 {
            let obs = sim.step(&vec![]).unwrap();
            if obs.frame.is_blank() {
                blanks.push(obs.wins);
                break;
            }
        }
        assert_eq!(blanks.len(), 1);
        assert!(blanks[0].game_decided());
        let after = sim.step(&vec![]).unwrap();
        assert!(!after.frame.is_blank());
        assert_eq!(after.wins, Wins::default());
    }

    #[test]
    fn closed_arcade_refuses_ticks() {
        let mut sim = arcade(0);
        sim.close().unwrap();
        assert!(sim.is_closed());
        assert!(sim.step(&vec![]).is_err());
    }

    #[test]
    fn out_of_range_knobs_are_clamped() {
        let options = AdapterOptions { frame_ratio: 60, ..Default::default() };
        let config = SimConfig {
            boot_starts: 1,
            intro_frames: 60,
            hit_rate: 7.5,
            attack_edge: 2.0,
            max_damage: -3,
            max_health: 0,
            ..Default::default()
        };
        let mut sim = SimulatedArcade::new(options, config, 11);
        assert_eq!(sim.config.hit_rate, 1.0);
        assert_eq!(sim.config.max_damage, 1);
        sim.step(&vec![Action::Start]).unwrap();
        let mut obs = sim.step(&vec![]).unwrap();
        while !obs.fighting {
            obs = sim.step(&vec![]).unwrap();
        }
        // Every tick lands exactly one point on P2 while attacking.
        let before = obs.health;
        let obs = sim.step(&vec![Action::Jab]).unwrap();
        assert_eq!(obs.health.p1, before.p1);
        assert_eq!(obs.health.p2, before.p2 - 1);
    }

    #[test]
    fn boot_count_follows_builtin_book() {
        let book = ScriptBook::builtin().unwrap();
        assert_eq!(SimConfig::for_book(&book, 3).boot_starts, 3);
        assert_eq!(SimConfig::for_book(&book, 8).boot_starts, 3);
    }
}
