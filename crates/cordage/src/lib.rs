//! # Cordage
//!
//! Typed handler registration, command synchronization and dispatch for
//! chat-platform bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────┐     ┌────────────┐     ┌──────────────────────────┐
//! │   Runtime   │────▶│ Gateway  │────▶│   Client   │────▶│ Interaction / text router │──▶ handler task
//! │ (BotRegistry│     │ (login,  │     │ (registries│     └──────────────────────────┘
//! │  per bot)   │     │  feed)   │     │  per bot)  │────▶ Synchronizer ──▶ CommandApi
//! └─────────────┘     └──────────┘     └────────────┘
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, starts and stops bots
//! - **Gateway**: the platform client; delivers interactions, messages and events
//! - **Modules**: classes declaring slash commands, components, events and more
//! - **Views**: reusable component layouts with their own handlers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cordage::prelude::*;
//!
//! #[derive(Default)]
//! struct Utility;
//!
//! impl Module for Utility {}
//!
//! #[register_module]
//! fn utility() -> ModuleClass<Utility> {
//!     ModuleClass::from_default(ModuleOptions::new("utility")).slash_command(
//!         "ping",
//!         SlashCommandOptions::new(CommandSpec::new("ping", "Replies with pong")),
//!         |_this, interaction| async move {
//!             info!(user = %interaction.user.id, "Pinged");
//!             Ok(())
//!         },
//!     )
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = CordageRuntime::new();
//!     runtime.register_bot("main", Arc::new(MyGateway::new()))?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use cordage_core as core;
pub use cordage_framework as framework;
pub use cordage_runtime as runtime;

pub use cordage_macros::{register_module, register_view};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use cordage::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use cordage_runtime::{CordageRuntime, CordageConfig};

    // Modules and their handler options
    pub use cordage_framework::{
        ArgKind, ArgSpec, ArgValue, AutoCompleteOptions, BoxError, Client, ComponentOptions,
        EventOptions, HandlerResult, Module, ModuleClass, ModuleOptions, SlashCommandOptions,
        SubCommandOptions, SyncPolicy, SyncTarget, TextArgs, TextCommandOptions,
    };

    // Views and guards
    pub use cordage_framework::{ButtonStyle, Guard, SelectOption, View, ViewComponent, ViewOptions, guard_fn};

    // Registration macros
    pub use cordage_macros::{register_module, register_view};

    // Platform model
    pub use cordage_core::{
        CommandApi, CommandData, CommandOption, CommandSpec, ComponentData, Gateway, GatewayEvent,
        Inbound, Interaction, InteractionData, Message, Snowflake, User,
    };

    // Logging
    pub use cordage_runtime::prelude::*;
}
