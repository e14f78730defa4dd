//! Cordage Runtime - Orchestration layer for the Cordage bot framework.
//!
//! This crate provides:
//! - Configuration loading (`figment`) and validation
//! - Logging setup (`tracing-subscriber`, `tracing-appender`)
//! - A registry of named bots (`BotRegistry`)
//! - Runtime orchestration (`CordageRuntime`)
//!
//! ```ignore
//! use cordage_runtime::CordageRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = CordageRuntime::new();
//!     runtime.register_bot("main", Arc::new(MyGateway::new()))?;
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Multiple Bots
//!
//! The primary bot is configured under `[bot]`, others under `[bots.<name>]`.
//! Each gets its own client, registries and command API:
//!
//! ```toml
//! [bot]
//! token = "..."
//! prefix = "!"
//!
//! [bots.helper]
//! token = "..."
//! synchronize = { global = false }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;

// Re-exports
pub use bot::{BotStatus, ManagedBot};
pub use config::{BotConfig, ConfigError, ConfigLoader, ConfigResult, CordageConfig, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use registry::{BotRegistry, RegistryStats};
pub use runtime::{CordageRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
