//! The per-bot client owning registries, event bus and jobs.
//!
//! A [`Client`] is the single entry point for inbound traffic:
//!
//! - [`interaction_received`](Client::interaction_received) for commands,
//!   autocomplete and components;
//! - [`message_received`](Client::message_received) for prefixed text
//!   commands;
//! - [`emit`](Client::emit) for every other gateway event.
//!
//! ```rust,ignore
//! let client = Arc::new(Client::new(ClientOptions::new("main").prefix("!"), api));
//! client.collect(CollectSource::Auto).await;
//! client.synchronize_commands().await;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cordage_core::{CommandApi, GatewayEvent, Inbound, Interaction, Message, Snowflake};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::collector::{CollectReport, CollectSource, Collector};
use crate::events::EventBus;
use crate::job::JobScheduler;
use crate::registry::Registries;
use crate::router::{InteractionRouter, RouteOutcome, TextRouter};
use crate::sync::SyncScopes;

/// Per-client settings.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Bot name, used in logs.
    pub name: String,
    /// Text command prefix. Text commands are ignored without one.
    pub prefix: Option<String>,
    /// Users allowed through developer-only handlers.
    pub developers: HashSet<Snowflake>,
    pub sync: SyncScopes,
    pub application_name: Option<String>,
    pub version: Option<String>,
}

impl ClientOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn developers(mut self, developers: impl IntoIterator<Item = impl Into<Snowflake>>) -> Self {
        self.developers = developers.into_iter().map(Into::into).collect();
        self
    }

    pub fn sync(mut self, sync: SyncScopes) -> Self {
        self.sync = sync;
        self
    }

    pub fn application(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self.version = Some(version.into());
        self
    }
}

pub struct Client {
    options: ClientOptions,
    registries: Registries,
    api: Arc<dyn CommandApi>,
    events: EventBus,
    jobs: JobScheduler,
}

impl Client {
    pub fn new(options: ClientOptions, api: Arc<dyn CommandApi>) -> Self {
        Self {
            options,
            registries: Registries::new(),
            api,
            events: EventBus::new(),
            jobs: JobScheduler::new(),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn api(&self) -> &Arc<dyn CommandApi> {
        &self.api
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn jobs(&self) -> &JobScheduler {
        &self.jobs
    }

    /// Collects modules and views into this client's registries.
    pub async fn collect(&self, source: CollectSource) -> CollectReport {
        Collector::new(&self.registries, &self.events)
            .collect(source)
            .await
    }

    pub fn interaction_router(&self) -> InteractionRouter<'_> {
        InteractionRouter::new(&self.registries, &self.options.developers)
    }

    pub fn text_router(&self) -> TextRouter<'_> {
        TextRouter::new(
            &self.registries,
            &self.options.developers,
            self.options.prefix.as_deref(),
        )
    }

    pub fn interaction_received(&self, interaction: Interaction) -> RouteOutcome {
        self.interaction_router().route(interaction)
    }

    /// Like [`interaction_received`](Self::interaction_received) with an
    /// explicit clock for the ttl check.
    pub fn interaction_received_at(&self, interaction: Interaction, now: DateTime<Utc>) -> RouteOutcome {
        self.interaction_router().route_at(interaction, now)
    }

    pub fn message_received(&self, message: Message) -> RouteOutcome {
        self.text_router().route(message)
    }

    /// Delivers a gateway event to its attached listeners.
    pub fn emit(&self, event: GatewayEvent) -> Vec<JoinHandle<()>> {
        self.events.emit(event)
    }

    /// Feeds one gateway item to the matching entry point.
    pub fn dispatch(&self, inbound: Inbound) {
        match inbound {
            Inbound::Interaction(interaction) => {
                self.interaction_received(interaction);
            }
            Inbound::Message(message) => {
                self.message_received(message);
            }
            Inbound::Event(event) => {
                self.emit(event);
            }
        }
    }

    /// Cancels jobs, detaches listeners and unloads every module.
    pub async fn shutdown(&self) {
        self.jobs.cancel_all();
        self.events.clear();

        let modules = self.registries.modules.values();
        let results = join_all(modules.iter().map(|descriptor| async move {
            (descriptor.name(), descriptor.instance().hooks().on_unload().await)
        }))
        .await;
        for (module, result) in results {
            if let Err(e) = result {
                error!(module, error = %e, "Module failed to unload");
            }
        }
        info!(client = %self.options.name, modules = modules.len(), "Client shut down");
    }
}
