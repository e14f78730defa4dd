//! Interaction routing.
//!
//! ```text
//!   Interaction
//!       │
//!       ├─ Command ──────▶ sub_commands[p_g_n] ──(miss)──▶ slash_commands[p]
//!       ├─ Autocomplete ─▶ auto_completes, most specific of p_g_n, p_g, p
//!       └─ Component ────▶ components[key] and views[key], each checked on its own
//!                           key = custom id up to the first `_`
//! ```
//!
//! Every hit runs the access checks before the executor is spawned. Component
//! hits additionally check author-only and ttl.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cordage_core::{CommandData, Interaction, InteractionData, Snowflake};
use tracing::{debug, debug_span, trace};

use super::access::{self, Access, Rejection};
use super::{RouteOutcome, spawn_handler};
use crate::custom_id;
use crate::handler::{Executor, Invocation};
use crate::key;
use crate::options::ComponentOptions;
use crate::registry::Registries;

/// Routes interactions to slash command, subcommand, autocomplete, component
/// and view handlers.
pub struct InteractionRouter<'a> {
    registries: &'a Registries,
    developers: &'a HashSet<Snowflake>,
}

impl<'a> InteractionRouter<'a> {
    pub fn new(registries: &'a Registries, developers: &'a HashSet<Snowflake>) -> Self {
        Self {
            registries,
            developers,
        }
    }

    /// Routes with the current time as "now".
    pub fn route(&self, interaction: Interaction) -> RouteOutcome {
        self.route_at(interaction, Utc::now())
    }

    /// Routes with an explicit "now" used by the ttl check.
    pub fn route_at(&self, interaction: Interaction, now: DateTime<Utc>) -> RouteOutcome {
        let interaction = Arc::new(interaction);
        match &interaction.data {
            InteractionData::Command(data) => self.route_command(data, interaction.clone()),
            InteractionData::Autocomplete(data) => self.route_autocomplete(data, interaction.clone()),
            InteractionData::Component(_) | InteractionData::ModalSubmit(_) => {
                self.route_component(interaction.clone(), now)
            }
        }
    }

    fn access(&self) -> Access<'_> {
        Access {
            registries: self.registries,
            developers: self.developers,
        }
    }

    fn route_command(&self, data: &CommandData, interaction: Arc<Interaction>) -> RouteOutcome {
        let user = interaction.user.id;

        if let Some(name) = data.sub_command() {
            let key = key::composite(&data.name, data.sub_command_group(), Some(name));
            let _span = debug_span!("route_sub_command", key = %key).entered();
            if let Some(entry) = self.registries.sub_commands.get(&key) {
                return self.dispatch(
                    key,
                    &entry.module,
                    entry.options.dev_only || self.parent_dev_only(data),
                    user,
                    &entry.executor,
                    Invocation::Command(interaction),
                );
            }
            trace!("No subcommand entry, trying the parent command");
        }

        let key = key::slash_command(&data.name);
        let _span = debug_span!("route_command", key = %key).entered();
        let Some(entry) = self.registries.slash_commands.get(&key) else {
            trace!("No command registered");
            return RouteOutcome::NotFound;
        };
        self.dispatch(
            key,
            &entry.module,
            entry.options.dev_only,
            user,
            &entry.executor,
            Invocation::Command(interaction),
        )
    }

    fn route_autocomplete(&self, data: &CommandData, interaction: Arc<Interaction>) -> RouteOutcome {
        let key = key::composite(&data.name, data.sub_command_group(), data.sub_command());
        let _span = debug_span!("route_autocomplete", key = %key).entered();
        let Some((matched, entry)) = self.registries.auto_completes.resolve_most_specific(&key) else {
            trace!("No autocomplete provider registered");
            return RouteOutcome::NotFound;
        };
        self.dispatch(
            matched,
            &entry.module,
            self.parent_dev_only(data),
            interaction.user.id,
            &entry.executor,
            Invocation::AutoComplete(interaction),
        )
    }

    /// Whether the parent slash command of `data` is developer-only.
    fn parent_dev_only(&self, data: &CommandData) -> bool {
        self.registries
            .slash_commands
            .get(&key::slash_command(&data.name))
            .is_some_and(|parent| parent.options.dev_only)
    }

    /// Looks the leading key up in the component and the view registries.
    /// Each hit runs its own guard chain; every hit that passes is spawned.
    fn route_component(&self, interaction: Arc<Interaction>, now: DateTime<Utc>) -> RouteOutcome {
        let Some(id) = interaction.custom_id() else {
            return RouteOutcome::NotFound;
        };
        let (leading, args) = custom_id::parse(id);
        let key = leading.to_string();
        let _span = debug_span!("route_component", key = %key).entered();

        let mut hits: Vec<(String, ComponentOptions, Executor)> = Vec::with_capacity(2);
        if let Some(entry) = self.registries.components.get(&key) {
            hits.push((entry.module.clone(), entry.options.clone(), entry.executor.clone()));
        }
        if let Some(entry) = self.registries.views.get(&key) {
            hits.push((entry.module().to_string(), entry.effective(), entry.executor.clone()));
        }
        if hits.is_empty() {
            trace!("No component or view registered");
            return RouteOutcome::NotFound;
        }

        let invocation = Invocation::Component { interaction: interaction.clone(), args };
        let mut handles = Vec::with_capacity(hits.len());
        let mut first_rejection = None;
        for (module, options, executor) in hits {
            match self.check_component(&module, &options, &interaction, now) {
                Ok(()) => handles.push(spawn_handler(key.clone(), executor, invocation.clone())),
                Err(rejection) => {
                    debug!(module = %module, %rejection, "Component rejected");
                    if first_rejection.is_none() {
                        first_rejection = Some(rejection);
                    }
                }
            }
        }

        match first_rejection {
            Some(rejection) if handles.is_empty() => RouteOutcome::Rejected(rejection),
            _ => RouteOutcome::Dispatched(handles),
        }
    }

    fn check_component(
        &self,
        module: &str,
        options: &ComponentOptions,
        interaction: &Interaction,
        now: DateTime<Utc>,
    ) -> Result<(), Rejection> {
        let access = self.access();
        access.module_enabled(module)?;
        access.developer(module, options.dev_only, interaction.user.id)?;
        if options.author_only {
            access::author_only(interaction)?;
        }
        if let Some(ttl) = options.ttl {
            access::within_ttl(interaction, ttl, now)?;
        }
        Ok(())
    }

    fn dispatch(
        &self,
        key: String,
        module: &str,
        dev_only: bool,
        user: Snowflake,
        executor: &Executor,
        invocation: Invocation,
    ) -> RouteOutcome {
        let access = self.access();
        let checked = access
            .module_enabled(module)
            .and_then(|()| access.developer(module, dev_only, user));
        if let Err(rejection) = checked {
            debug!(%rejection, "Interaction rejected");
            return RouteOutcome::Rejected(rejection);
        }
        RouteOutcome::Dispatched(vec![spawn_handler(key, executor.clone(), invocation)])
    }
}
