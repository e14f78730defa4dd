//! Inbound interactions: commands, autocomplete requests and component clicks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CommandOptionKind, Message, Snowflake, User};

/// One option value of an invoked command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CommandOptionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub focused: bool,
}

impl CommandOption {
    /// A leaf option carrying a value.
    pub fn value(name: impl Into<String>, kind: CommandOptionKind, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Some(value.into()),
            options: Vec::new(),
            focused: false,
        }
    }

    /// A subcommand option wrapping its own options.
    pub fn sub_command(name: impl Into<String>, options: Vec<CommandOption>) -> Self {
        Self {
            name: name.into(),
            kind: CommandOptionKind::SubCommand,
            value: None,
            options,
            focused: false,
        }
    }

    /// A subcommand group wrapping exactly one subcommand.
    pub fn group(name: impl Into<String>, sub_command: CommandOption) -> Self {
        Self {
            name: name.into(),
            kind: CommandOptionKind::SubCommandGroup,
            value: None,
            options: vec![sub_command],
            focused: false,
        }
    }

    /// Marks the option as the one being autocompleted.
    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }
}

/// Payload of a command or autocomplete interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Name of the invoked subcommand group, if any.
    pub fn sub_command_group(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.kind == CommandOptionKind::SubCommandGroup)
            .map(|o| o.name.as_str())
    }

    /// Name of the invoked subcommand, looking through a group if present.
    pub fn sub_command(&self) -> Option<&str> {
        let scope = match self
            .options
            .iter()
            .find(|o| o.kind == CommandOptionKind::SubCommandGroup)
        {
            Some(group) => &group.options,
            None => &self.options,
        };
        scope
            .iter()
            .find(|o| o.kind == CommandOptionKind::SubCommand)
            .map(|o| o.name.as_str())
    }

    /// Leaf options of the innermost invoked (sub)command.
    pub fn leaf_options(&self) -> &[CommandOption] {
        let mut scope = self.options.as_slice();
        while let Some(nested) = scope.iter().find(|o| {
            matches!(
                o.kind,
                CommandOptionKind::SubCommand | CommandOptionKind::SubCommandGroup
            )
        }) {
            scope = nested.options.as_slice();
        }
        scope
    }

    /// Looks up a leaf option by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.leaf_options()
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    /// The option currently being autocompleted.
    pub fn focused(&self) -> Option<&CommandOption> {
        self.leaf_options().iter().find(|o| o.focused)
    }
}

/// Kind of message component that produced an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    StringSelect,
    UserSelect,
    RoleSelect,
    ChannelSelect,
    MentionableSelect,
}

/// Payload of a button or select menu interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    pub custom_id: String,
    pub kind: ComponentKind,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Payload of a submitted modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalSubmitData {
    pub custom_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InteractionData {
    Command(CommandData),
    Autocomplete(CommandData),
    Component(ComponentData),
    ModalSubmit(ModalSubmitData),
}

/// An inbound interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Snowflake,
    pub user: User,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    /// The message a component is attached to.
    #[serde(default)]
    pub message: Option<Message>,
    pub data: InteractionData,
}

impl Interaction {
    pub fn new(id: impl Into<Snowflake>, user: User, data: InteractionData) -> Self {
        Self {
            id: id.into(),
            user,
            guild_id: None,
            channel_id: None,
            message: None,
            data,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.channel_id = Some(message.channel_id);
        self.guild_id = message.guild_id;
        self.message = Some(message);
        self
    }

    pub fn in_guild(mut self, guild_id: impl Into<Snowflake>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Command payload for command and autocomplete interactions.
    pub fn command(&self) -> Option<&CommandData> {
        match &self.data {
            InteractionData::Command(data) | InteractionData::Autocomplete(data) => Some(data),
            _ => None,
        }
    }

    /// Custom identifier for component and modal interactions.
    pub fn custom_id(&self) -> Option<&str> {
        match &self.data {
            InteractionData::Component(data) => Some(&data.custom_id),
            InteractionData::ModalSubmit(data) => Some(&data.custom_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_command_path_through_group() {
        let data = CommandData::new("config").option(CommandOption::group(
            "role",
            CommandOption::sub_command(
                "add",
                vec![CommandOption::value("name", CommandOptionKind::String, "mod")],
            ),
        ));

        assert_eq!(data.sub_command_group(), Some("role"));
        assert_eq!(data.sub_command(), Some("add"));
        assert_eq!(data.get("name"), Some(&Value::from("mod")));
    }

    #[test]
    fn test_sub_command_without_group() {
        let data = CommandData::new("tag").option(CommandOption::sub_command(
            "show",
            vec![CommandOption::value("q", CommandOptionKind::String, "ru").focused()],
        ));

        assert_eq!(data.sub_command_group(), None);
        assert_eq!(data.sub_command(), Some("show"));
        assert_eq!(data.focused().map(|o| o.name.as_str()), Some("q"));
    }

    #[test]
    fn test_plain_command_has_no_path() {
        let data = CommandData::new("ping")
            .option(CommandOption::value("n", CommandOptionKind::Integer, 3));
        assert_eq!(data.sub_command(), None);
        assert_eq!(data.leaf_options().len(), 1);
    }
}
