//! Boundaries to the platform client.
//!
//! Cordage does not speak the platform's wire protocol. A gateway
//! implementation provides two things:
//!
//! - a [`CommandApi`] with bulk-replace semantics for application commands;
//! - a stream of [`Inbound`] items once logged in.
//!
//! ```rust,ignore
//! struct MyGateway { api: Arc<MyRestClient> }
//!
//! #[async_trait]
//! impl Gateway for MyGateway {
//!     fn command_api(&self) -> Arc<dyn CommandApi> {
//!         self.api.clone()
//!     }
//!
//!     async fn login(&self, token: &str) -> ApiResult<mpsc::Receiver<Inbound>> {
//!         let (tx, rx) = mpsc::channel(256);
//!         spawn_shard(token, tx).await?;
//!         Ok(rx)
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ApiResult;
use crate::model::{CommandSpec, GatewayEvent, Interaction, Message, Snowflake};

/// Remote application-command API.
///
/// Only bulk replacement is assumed; there is no incremental add or remove
/// primitive.
#[async_trait]
pub trait CommandApi: Send + Sync {
    /// Replaces every global command with `commands`.
    async fn replace_global_commands(&self, commands: Vec<CommandSpec>)
    -> ApiResult<Vec<CommandSpec>>;

    /// Replaces every command of one guild with `commands`.
    async fn replace_guild_commands(
        &self,
        guild_id: Snowflake,
        commands: Vec<CommandSpec>,
    ) -> ApiResult<Vec<CommandSpec>>;

    /// Fetches the currently published global commands.
    async fn get_global_commands(&self) -> ApiResult<Vec<CommandSpec>>;

    /// Fetches the currently published commands of one guild.
    async fn get_guild_commands(&self, guild_id: Snowflake) -> ApiResult<Vec<CommandSpec>>;
}

/// One item delivered by a connected gateway.
#[derive(Debug, Clone)]
pub enum Inbound {
    Interaction(Interaction),
    Message(Message),
    Event(GatewayEvent),
}

/// A platform connection.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Command API bound to this connection's application.
    fn command_api(&self) -> Arc<dyn CommandApi>;

    /// Logs in and returns the inbound feed. The feed ends when the
    /// connection closes.
    async fn login(&self, token: &str) -> ApiResult<mpsc::Receiver<Inbound>>;
}
