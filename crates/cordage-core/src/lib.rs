//! # Cordage Core
//!
//! The platform-facing foundation of the Cordage bot framework.
//!
//! This crate holds what every other layer agrees on:
//!
//! - **Data model**: snowflakes, users, messages, interactions, gateway
//!   events and command declarations ([`model`]).
//! - **Boundaries**: the bulk-replace [`CommandApi`] and the inbound
//!   [`Gateway`] feed that a platform client implements.
//! - **Errors**: [`ApiError`] for remote calls, [`ClientError`] for login.
//!
//! ```text
//! ┌─────────────┐  Inbound   ┌──────────────────┐  CommandApi  ┌────────────┐
//! │   Gateway   │──────────▶│ cordage-framework │────────────▶│  Platform  │
//! │ (external)  │            │  (routers, sync)  │              │   (REST)   │
//! └─────────────┘            └──────────────────┘              └────────────┘
//! ```

pub mod error;
pub mod gateway;
pub mod model;

pub use error::{ApiError, ApiResult, BoxError, ClientError, ClientResult};
pub use gateway::{CommandApi, Gateway, Inbound};
pub use model::{
    CommandChoice, CommandData, CommandOption, CommandOptionKind, CommandOptionSpec, CommandSpec,
    ComponentData, ComponentKind, GatewayEvent, Interaction, InteractionData, Message,
    ModalSubmitData, ParseSnowflakeError, Snowflake, TimestampStyle, User, names,
    parse_channel_mention, parse_role_mention, parse_user_mention, timestamp_tag,
};
