use crate::emulator::Wins;

/// Everything the environment can fail with. None of these are retried.
#[derive(thiserror::Error, Debug)]
pub enum EnvError {
    /// The caller used the environment out of order (step before start,
    /// step after the round ended, anything after close).
    #[error("call order violation: {0}")]
    CallOrder(&'static str),
    /// The win tally read at game end was not a 2-vs-<2 split. The adapter
    /// has drifted out of sync with the game.
    #[error("environment attempted to reset while player wins on {0}")]
    Consistency(Wins),
    #[error("{table} index {index} outside 0..{len}")]
    Index {
        table: &'static str,
        index: usize,
        len: usize,
    },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("transition script: {0}")]
    Script(String),
    /// Opaque emulator failure (process crash, disconnect, ...).
    #[error(transparent)]
    Adapter(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EnvError>;
