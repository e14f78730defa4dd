//! Runtime error types.

use cordage_core::ClientError;
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The primary bot could not be brought online.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// No bot with this name is configured.
    #[error("Bot not configured: {0}")]
    BotNotFound(String),

    /// A bot with this name is already registered.
    #[error("Bot already registered: {0}")]
    BotExists(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
