//! Configuration for the Cordage runtime.
//!
//! Settings are layered with figment from defaults, config files,
//! `CORDAGE_*` environment variables and programmatic merges, then validated.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, CollectorConfig, CordageConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, PRIMARY_BOT, SpanEventConfig, SyncConfig,
};
pub use validation::validate_config;
