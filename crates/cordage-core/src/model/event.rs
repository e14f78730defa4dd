use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known gateway event names.
pub mod names {
    pub const READY: &str = "ready";
    pub const GUILD_CREATE: &str = "guild_create";
    pub const GUILD_DELETE: &str = "guild_delete";
    pub const GUILD_MEMBER_ADD: &str = "guild_member_add";
    pub const GUILD_MEMBER_REMOVE: &str = "guild_member_remove";
    pub const MESSAGE_CREATE: &str = "message_create";
    pub const MESSAGE_DELETE: &str = "message_delete";
    pub const INTERACTION_CREATE: &str = "interaction_create";
    pub const VOICE_STATE_UPDATE: &str = "voice_state_update";
}

/// A raw gateway event, identified by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Deserializes the payload into `T`.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }
}
