//! Options attached to modules and handlers when they are declared.
//!
//! Each struct here is the payload of one [`Tag`](crate::tag::Tag) kind. They
//! are plain data with small builder methods; nothing in them runs code except
//! the optional [`SyncPolicy::Resolver`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cordage_core::{CommandSpec, Snowflake};
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::BoxError;

use crate::client::Client;

/// Module-level options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOptions {
    /// Unique module name.
    pub name: String,
    /// Restrict every handler of the module to developers.
    pub dev_only: bool,
}

impl ModuleOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dev_only: false,
        }
    }

    pub fn dev_only(mut self, dev_only: bool) -> Self {
        self.dev_only = dev_only;
        self
    }
}

/// Gateway event listener options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOptions {
    /// Gateway event name, e.g. [`names::READY`](cordage_core::names::READY).
    pub name: String,
    /// Detach the listener after its first call.
    pub once: bool,
}

impl EventOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            once: false,
        }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

// ─── Sync policy ─────────────────────────────────────────────────────────────

/// Where a slash command is published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncTarget {
    pub global: bool,
    pub guilds: Vec<Snowflake>,
}

impl SyncTarget {
    /// Published globally only. This is the default for commands without a
    /// policy.
    pub fn global() -> Self {
        Self {
            global: true,
            guilds: Vec::new(),
        }
    }

    /// Published to the given guilds only.
    pub fn guilds(guilds: impl IntoIterator<Item = impl Into<Snowflake>>) -> Self {
        Self {
            global: false,
            guilds: guilds.into_iter().map(Into::into).collect(),
        }
    }
}

/// Async resolver computing a [`SyncTarget`] from the live client.
pub type SyncResolver =
    Arc<dyn Fn(Arc<Client>) -> BoxFuture<'static, Result<SyncTarget, BoxError>> + Send + Sync>;

/// Per-command publication policy.
#[derive(Clone)]
pub enum SyncPolicy {
    Static(SyncTarget),
    Resolver(SyncResolver),
}

impl SyncPolicy {
    /// Builds a resolver policy from an async closure.
    pub fn resolver<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Client>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SyncTarget, BoxError>> + Send + 'static,
    {
        Self::Resolver(Arc::new(move |client| f(client).boxed()))
    }

    /// Produces the target, invoking the resolver if there is one.
    pub async fn resolve(&self, client: Arc<Client>) -> Result<SyncTarget, BoxError> {
        match self {
            Self::Static(target) => Ok(target.clone()),
            Self::Resolver(resolve) => resolve(client).await,
        }
    }
}

impl From<SyncTarget> for SyncPolicy {
    fn from(target: SyncTarget) -> Self {
        Self::Static(target)
    }
}

impl fmt::Debug for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(target) => f.debug_tuple("Static").field(target).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

// ─── Interaction handlers ────────────────────────────────────────────────────

/// Top-level slash command options.
#[derive(Debug, Clone)]
pub struct SlashCommandOptions {
    pub spec: CommandSpec,
    pub dev_only: bool,
    /// `None` publishes globally.
    pub sync: Option<SyncPolicy>,
}

impl SlashCommandOptions {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            dev_only: false,
            sync: None,
        }
    }

    pub fn dev_only(mut self, dev_only: bool) -> Self {
        self.dev_only = dev_only;
        self
    }

    pub fn sync(mut self, policy: impl Into<SyncPolicy>) -> Self {
        self.sync = Some(policy.into());
        self
    }
}

/// Subcommand handler options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommandOptions {
    pub parent: String,
    pub group: Option<String>,
    pub name: String,
    pub dev_only: bool,
}

impl SubCommandOptions {
    pub fn new(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            group: None,
            name: name.into(),
            dev_only: false,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn dev_only(mut self, dev_only: bool) -> Self {
        self.dev_only = dev_only;
        self
    }
}

/// Autocomplete provider options.
///
/// Leaving out `group` or `name` registers a provider for every subcommand
/// below that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCompleteOptions {
    pub parent: String,
    pub group: Option<String>,
    pub name: Option<String>,
}

impl AutoCompleteOptions {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            group: None,
            name: None,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Component (button, select menu, modal) handler options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Leading key of the component's custom id.
    pub custom_id: String,
    /// Only the author of the message carrying the component may use it.
    pub author_only: bool,
    pub dev_only: bool,
    /// Validity window measured from the message's creation time.
    pub ttl: Option<Duration>,
}

impl ComponentOptions {
    pub fn new(custom_id: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            author_only: false,
            dev_only: false,
            ttl: None,
        }
    }

    pub fn author_only(mut self, author_only: bool) -> Self {
        self.author_only = author_only;
        self
    }

    pub fn dev_only(mut self, dev_only: bool) -> Self {
        self.dev_only = dev_only;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

// ─── Text commands ───────────────────────────────────────────────────────────

/// Value type a text command argument may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// A user mention or bare id.
    User,
    /// A role mention or bare id.
    Role,
    /// A channel mention or bare id.
    Channel,
    /// Any single token.
    String,
    /// A token parsing as a number.
    Number,
    /// All remaining tokens joined by single spaces. Ends parsing.
    Text,
}

/// One positional argument of a text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: Option<String>,
    /// Candidate types, tried in order.
    pub types: Vec<ArgKind>,
    pub required: bool,
}

impl ArgSpec {
    /// A required argument accepting the given types.
    pub fn required(types: impl IntoIterator<Item = ArgKind>) -> Self {
        Self {
            name: None,
            types: types.into_iter().collect(),
            required: true,
        }
    }

    /// An optional argument accepting the given types.
    pub fn optional(types: impl IntoIterator<Item = ArgKind>) -> Self {
        Self {
            required: false,
            ..Self::required(types)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Prefix-triggered text command options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCommandOptions {
    pub name: String,
    pub description: Option<String>,
    pub args: Vec<ArgSpec>,
    pub dev_only: bool,
}

impl TextCommandOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            args: Vec::new(),
            dev_only: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn dev_only(mut self, dev_only: bool) -> Self {
        self.dev_only = dev_only;
        self
    }
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// View-level options, combined with each component's own at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    /// Name of the module whose enabled flag governs the view.
    pub module: String,
    pub dev_only: bool,
    pub author_only: bool,
    pub ttl: Option<Duration>,
}

impl ViewOptions {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            dev_only: false,
            author_only: false,
            ttl: None,
        }
    }

    pub fn dev_only(mut self, dev_only: bool) -> Self {
        self.dev_only = dev_only;
        self
    }

    pub fn author_only(mut self, author_only: bool) -> Self {
        self.author_only = author_only;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
