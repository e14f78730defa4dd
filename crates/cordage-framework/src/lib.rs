//! # Cordage Framework
//!
//! Handler registration, command synchronization and dispatch.
//!
//! This layer provides:
//! - Module classes that declare handlers through a tag store
//! - A collector that instantiates modules and fills keyed registries
//! - A synchronizer that publishes slash commands through bulk replacement
//! - Interaction and text routers with module, developer, author and ttl checks
//! - Runtime enable/disable of modules
//! - Views, custom guards and scheduled jobs
//!
//! ```text
//! ModuleClass ──▶ TagStore ──▶ Collector ──▶ Registries ──▶ Routers ──▶ handler task
//!                                               │
//!                                               └──▶ Synchronizer ──▶ CommandApi
//! ```

pub mod client;
pub mod collector;
pub mod custom_id;
pub mod error;
pub mod events;
pub mod guard;
pub mod handler;
pub mod job;
pub mod key;
pub mod lifecycle;
pub mod module;
pub mod options;
pub mod registry;
pub mod router;
pub mod sync;
pub mod tag;
pub mod view;

#[cfg(test)]
mod testing;

pub use client::{Client, ClientOptions};
pub use collector::{CollectReport, CollectSource, Collector, MODULE_SOURCES, Sources, VIEW_SOURCES};
pub use error::{CollectError, GuardRejected, InvocationMismatch, JobError, LifecycleError, LifecycleResult};
pub use events::EventBus;
pub use guard::{Guard, GuardLayer, guard_fn};
pub use handler::{Executor, HandlerResult, Invocation};
pub use job::{JobSchedule, JobScheduler};
pub use lifecycle::{LifecycleChange, ModuleKey};
pub use module::{Module, ModuleClass, ModuleDescriptor, ModuleInstance, ModuleSource};
pub use options::{
    ArgKind, ArgSpec, AutoCompleteOptions, ComponentOptions, EventOptions, ModuleOptions,
    SlashCommandOptions, SubCommandOptions, SyncPolicy, SyncTarget, TextCommandOptions, ViewOptions,
};
pub use registry::{Registries, RegistryCounts};
pub use router::{ArgValue, InteractionRouter, Rejection, RouteOutcome, TextArgs, TextRouter};
pub use sync::{SyncMode, SyncReport, SyncScope, SyncScopes, Synchronizer};
pub use tag::{Tag, TagKind, TagStore, TagTarget};
pub use view::{ButtonStyle, Row, SelectOption, View, ViewBuilder, ViewComponent};

pub use linkme;
pub use tower::BoxError;
