//! Platform data model.

mod command;
mod event;
mod interaction;
mod message;
mod snowflake;

pub use command::{CommandChoice, CommandOptionKind, CommandOptionSpec, CommandSpec};
pub use event::{GatewayEvent, names};
pub use interaction::{
    CommandData, CommandOption, ComponentData, ComponentKind, Interaction, InteractionData,
    ModalSubmitData,
};
pub use message::{Message, User};
pub use snowflake::{
    ParseSnowflakeError, Snowflake, TimestampStyle, parse_channel_mention, parse_role_mention,
    parse_user_mention, timestamp_tag,
};
