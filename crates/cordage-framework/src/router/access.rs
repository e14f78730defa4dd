//! Access checks shared by the routers.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cordage_core::{Interaction, Snowflake};

use crate::registry::Registries;

/// Why a route stopped before calling its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The owning module is disabled or unknown.
    ModuleDisabled,
    /// The handler is developer-only and the user is not a developer.
    DeveloperOnly,
    /// The component is author-only and the user did not author the message.
    AuthorOnly,
    /// The component's ttl has elapsed.
    Expired,
    /// A required text command argument is missing or malformed.
    MissingArgument { index: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleDisabled => f.write_str("module disabled"),
            Self::DeveloperOnly => f.write_str("developer only"),
            Self::AuthorOnly => f.write_str("author only"),
            Self::Expired => f.write_str("expired"),
            Self::MissingArgument { index } => write!(f, "missing argument #{index}"),
        }
    }
}

/// Module and developer checks against a client's registries.
pub(crate) struct Access<'a> {
    pub registries: &'a Registries,
    pub developers: &'a HashSet<Snowflake>,
}

impl Access<'_> {
    /// Fails unless `module` exists and is enabled.
    pub fn module_enabled(&self, module: &str) -> Result<(), Rejection> {
        if self.registries.is_enabled(module) {
            Ok(())
        } else {
            Err(Rejection::ModuleDisabled)
        }
    }

    /// Fails when either the module or the handler is developer-only and
    /// `user` is not a developer.
    pub fn developer(&self, module: &str, handler_dev_only: bool, user: Snowflake) -> Result<(), Rejection> {
        let module_dev_only = self
            .registries
            .modules
            .get(module)
            .is_some_and(|descriptor| descriptor.dev_only());
        if (module_dev_only || handler_dev_only) && !self.developers.contains(&user) {
            return Err(Rejection::DeveloperOnly);
        }
        Ok(())
    }
}

/// Fails unless the interacting user authored the message carrying the
/// component. An interaction without a message never passes.
pub(crate) fn author_only(interaction: &Interaction) -> Result<(), Rejection> {
    match &interaction.message {
        Some(message) if message.author.id == interaction.user.id => Ok(()),
        _ => Err(Rejection::AuthorOnly),
    }
}

/// Fails when `created_at + ttl <= now`. Not enforced without a message.
pub(crate) fn within_ttl(interaction: &Interaction, ttl: Duration, now: DateTime<Utc>) -> Result<(), Rejection> {
    let Some(message) = &interaction.message else {
        return Ok(());
    };
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    match message.created_at.checked_add_signed(ttl) {
        Some(expires_at) if expires_at <= now => Err(Rejection::Expired),
        _ => Ok(()),
    }
}
