use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::emulator::AdapterOptions;
use crate::error::{EnvError, Result};

// =============================================================================
// Timing Constants (visible frames at frame ratio 1)
// =============================================================================

/// Victory pose plus round intro before a new game becomes controllable.
pub const NEW_GAME_SETTLE_FRAMES: u32 = 234;
/// Idle frames burned at startup when pacing to real time.
pub const THROTTLE_WARMUP_FRAMES: u32 = 250;

pub const MAX_DIFFICULTY: u8 = 8;

// =============================================================================
// Environment Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Story-mode difficulty level.
    pub difficulty: u8,
    /// Emulator ticks per visible frame.
    pub frame_ratio: u32,
    /// Ticks bundled into one agent step.
    pub frames_per_step: usize,
    pub throttle: bool,
    pub render: bool,
    pub debug: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            difficulty: 3,
            frame_ratio: 3,
            frames_per_step: 3,
            throttle: false,
            render: true,
            debug: false,
        }
    }
}

impl EnvConfig {
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            EnvError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|err| {
            EnvError::Config(format!("failed to parse {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_ratio == 0 {
            return Err(EnvError::Config("frame_ratio must be at least 1".into()));
        }
        if self.frames_per_step == 0 {
            return Err(EnvError::Config("frames_per_step must be at least 1".into()));
        }
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(EnvError::Config(format!(
                "difficulty {} outside 1..={MAX_DIFFICULTY}",
                self.difficulty
            )));
        }
        Ok(())
    }

    /// No-op ticks consumed after a new game's fight starts.
    pub fn settle_delay_ticks(&self) -> u32 {
        (NEW_GAME_SETTLE_FRAMES as f64 / self.frame_ratio as f64).round() as u32
    }

    pub fn throttle_ticks(&self) -> u32 {
        THROTTLE_WARMUP_FRAMES / self.frame_ratio
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            frame_ratio: self.frame_ratio,
            render: self.render,
            throttle: self.throttle,
            debug: self.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = EnvConfig::default();
        config.validate().unwrap();
        assert_eq!(config.settle_delay_ticks(), 78);
        assert_eq!(config.throttle_ticks(), 83);
    }

    #[test]
    fn settle_delay_rounds_to_nearest() {
        let at = |frame_ratio| EnvConfig { frame_ratio, ..Default::default() }.settle_delay_ticks();
        assert_eq!(at(1), 234);
        assert_eq!(at(4), 59);
        assert_eq!(at(5), 47);
        assert_eq!(at(7), 33);
    }

    #[test]
    fn zero_ratio_or_window_is_rejected() {
        let bad_ratio = EnvConfig { frame_ratio: 0, ..Default::default() };
        assert!(matches!(bad_ratio.validate(), Err(EnvError::Config(_))));
        let bad_window = EnvConfig { frames_per_step: 0, ..Default::default() };
        assert!(bad_window.validate().is_err());
        let bad_difficulty = EnvConfig { difficulty: 9, ..Default::default() };
        assert!(bad_difficulty.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EnvConfig = serde_json::from_str(r#"{"frames_per_step": 1, "debug": true}"#).unwrap();
        assert_eq!(config.frames_per_step, 1);
        assert!(config.debug);
        assert_eq!(config.frame_ratio, 3);
        assert_eq!(config.difficulty, 3);
    }

    #[test]
    fn adapter_gets_passthrough_flags() {
        let config = EnvConfig { render: false, debug: true, ..Default::default() };
        let opts = config.adapter_options();
        assert!(!opts.render);
        assert!(opts.debug);
        assert_eq!(opts.frame_ratio, 3);
    }
}
