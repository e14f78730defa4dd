//! Module classes: the unit of handler registration.
//!
//! A module is a plain struct implementing [`Module`]. Its handlers are
//! declared on a [`ModuleClass`], which records each method's options in a
//! [`TagStore`] and keeps the method itself under its name. Nothing is bound
//! to an instance until the collector asks the class to
//! [`instantiate`](ModuleSource::instantiate) and [`bind`](ModuleSource::bind).
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct Greeter {
//!     greeted: AtomicUsize,
//! }
//!
//! impl Module for Greeter {}
//!
//! fn greeter() -> ModuleClass<Greeter> {
//!     ModuleClass::from_default(ModuleOptions::new("greeter"))
//!         .slash_command(
//!             "hello",
//!             SlashCommandOptions::new(CommandSpec::new("hello", "Say hi")),
//!             |this, _interaction| async move {
//!                 this.greeted.fetch_add(1, Ordering::Relaxed);
//!                 Ok(())
//!             },
//!         )
//!         .event("on_ready", EventOptions::new(names::READY).once(), |_, _| async { Ok(()) })
//! }
//! ```

mod descriptor;

pub use descriptor::ModuleDescriptor;

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use cordage_core::{GatewayEvent, Interaction, Message};
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::BoxError;
use tower_layer::Layer;
use tracing::warn;

use crate::guard::{FnService, Guard, GuardLayer};
use crate::handler::{Executor, HandlerResult, Invocation, mismatch};
use crate::options::{
    AutoCompleteOptions, ComponentOptions, EventOptions, ModuleOptions, SlashCommandOptions,
    SubCommandOptions, TextCommandOptions,
};
use crate::router::text::TextArgs;
use crate::tag::{Tag, TagKind, TagStore, TagTarget};

/// Lifecycle hooks of a module instance. All default to no-ops.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Runs once after instantiation, during collection.
    async fn on_load(&self) -> HandlerResult {
        Ok(())
    }

    /// Runs when the owning client shuts down.
    async fn on_unload(&self) -> HandlerResult {
        Ok(())
    }

    /// Runs before the module is re-enabled. An error keeps it disabled.
    async fn on_enable(&self) -> HandlerResult {
        Ok(())
    }

    /// Runs before the module is disabled. An error keeps it enabled.
    async fn on_disable(&self) -> HandlerResult {
        Ok(())
    }
}

/// The single live instance of a module class.
#[derive(Clone)]
pub struct ModuleInstance {
    hooks: Arc<dyn Module>,
    object: Arc<dyn Any + Send + Sync>,
}

impl ModuleInstance {
    pub fn new<M: Module>(module: M) -> Self {
        let module = Arc::new(module);
        Self {
            hooks: module.clone(),
            object: module,
        }
    }

    pub fn hooks(&self) -> &dyn Module {
        self.hooks.as_ref()
    }

    /// The concrete instance, if it is an `M`.
    pub fn downcast<M: Module>(&self) -> Option<Arc<M>> {
        self.object.clone().downcast::<M>().ok()
    }
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance").finish_non_exhaustive()
    }
}

/// A method stored on a [`ModuleClass`], taking the instance explicitly.
pub type MethodFn<M> =
    Arc<dyn Fn(Arc<M>, Invocation) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

type Factory<M> = Arc<dyn Fn() -> Result<M, BoxError> + Send + Sync>;

// ─── ModuleSource ────────────────────────────────────────────────────────────

/// Object-safe view of a [`ModuleClass`] used by the collector.
pub trait ModuleSource: Send + Sync + 'static {
    /// Identity used for class-level tags.
    fn class_id(&self) -> TypeId;

    fn type_name(&self) -> &'static str;

    fn tags(&self) -> &TagStore;

    /// Declared method names, in declaration order.
    fn methods(&self) -> Vec<&'static str>;

    /// Builds the module instance.
    fn instantiate(&self) -> Result<ModuleInstance, BoxError>;

    /// Binds `method` to `instance`, wrapped in the method's guards.
    ///
    /// Returns `None` if the method is unknown or the instance belongs to a
    /// different class.
    fn bind(&self, instance: &ModuleInstance, method: &str) -> Option<Executor>;
}

// ─── ModuleClass ─────────────────────────────────────────────────────────────

/// Explicit registration builder for a module type.
pub struct ModuleClass<M> {
    factory: Factory<M>,
    tags: TagStore,
    methods: Vec<(&'static str, MethodFn<M>)>,
    guards: HashMap<&'static str, Vec<Arc<dyn Guard>>>,
}

impl<M: Module> ModuleClass<M> {
    /// Declares a module built by `factory`.
    pub fn new<F>(options: ModuleOptions, factory: F) -> Self
    where
        F: Fn() -> Result<M, BoxError> + Send + Sync + 'static,
    {
        let mut tags = TagStore::new();
        tags.tag(TagTarget::Class(TypeId::of::<M>()), Tag::Module(options));
        Self {
            factory: Arc::new(factory),
            tags,
            methods: Vec::new(),
            guards: HashMap::new(),
        }
    }

    /// Declares a module built with [`Default`].
    pub fn from_default(options: ModuleOptions) -> Self
    where
        M: Default,
    {
        Self::new(options, || Ok(M::default()))
    }

    /// The module-level options.
    pub fn options(&self) -> Option<&ModuleOptions> {
        match self
            .tags
            .read_tag(TagTarget::Class(TypeId::of::<M>()), TagKind::Module)
        {
            Some(Tag::Module(options)) => Some(options),
            _ => None,
        }
    }

    pub fn event<F, Fut>(self, method: &'static str, options: EventOptions, f: F) -> Self
    where
        F: Fn(Arc<M>, Arc<GatewayEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.declare(
            method,
            Tag::Event(options),
            Arc::new(move |this: Arc<M>, invocation: Invocation| match invocation {
                Invocation::Event(event) => f(this, event).boxed(),
                other => mismatch(method, "event", &other),
            }),
        )
    }

    pub fn slash_command<F, Fut>(self, method: &'static str, options: SlashCommandOptions, f: F) -> Self
    where
        F: Fn(Arc<M>, Arc<Interaction>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.declare(method, Tag::SlashCommand(options), command_method(method, f))
    }

    pub fn sub_command<F, Fut>(self, method: &'static str, options: SubCommandOptions, f: F) -> Self
    where
        F: Fn(Arc<M>, Arc<Interaction>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.declare(method, Tag::SubCommand(options), command_method(method, f))
    }

    pub fn auto_complete<F, Fut>(self, method: &'static str, options: AutoCompleteOptions, f: F) -> Self
    where
        F: Fn(Arc<M>, Arc<Interaction>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.declare(
            method,
            Tag::AutoComplete(options),
            Arc::new(move |this: Arc<M>, invocation: Invocation| match invocation {
                Invocation::AutoComplete(interaction) => f(this, interaction).boxed(),
                other => mismatch(method, "auto_complete", &other),
            }),
        )
    }

    /// Declares a component handler. It receives the custom-id arguments that
    /// follow the leading key.
    pub fn component<F, Fut>(self, method: &'static str, options: ComponentOptions, f: F) -> Self
    where
        F: Fn(Arc<M>, Arc<Interaction>, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.declare(
            method,
            Tag::Component(options),
            Arc::new(move |this: Arc<M>, invocation: Invocation| match invocation {
                Invocation::Component { interaction, args } => f(this, interaction, args).boxed(),
                other => mismatch(method, "component", &other),
            }),
        )
    }

    pub fn text_command<F, Fut>(self, method: &'static str, options: TextCommandOptions, f: F) -> Self
    where
        F: Fn(Arc<M>, Arc<Message>, TextArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.declare(
            method,
            Tag::TextCommand(options),
            Arc::new(move |this: Arc<M>, invocation: Invocation| match invocation {
                Invocation::Text { message, args } => f(this, message, args).boxed(),
                other => mismatch(method, "text", &other),
            }),
        )
    }

    /// Attaches a guard to an already declared method. Guards run in the
    /// order they are attached.
    pub fn guard(mut self, method: &'static str, guard: impl Guard) -> Self {
        if !self.methods.iter().any(|(name, _)| *name == method) {
            warn!(
                module = type_name::<M>(),
                method, "Guard attached to an undeclared method is ignored"
            );
            return self;
        }
        self.guards.entry(method).or_default().push(Arc::new(guard));
        self
    }

    fn declare(mut self, method: &'static str, tag: Tag, f: MethodFn<M>) -> Self {
        let target = TagTarget::Method(TypeId::of::<M>(), method);
        if let Some(previous) = self
            .tags
            .handler_kind(target)
            .filter(|previous| *previous != tag.kind())
        {
            warn!(
                module = type_name::<M>(),
                method,
                previous = %previous,
                current = %tag.kind(),
                "Method re-declared as a different handler kind, earlier tag replaced"
            );
            self.tags.untag(target, previous);
        }
        self.tags.tag(target, tag);

        match self.methods.iter_mut().find(|(name, _)| *name == method) {
            Some(slot) => slot.1 = f,
            None => self.methods.push((method, f)),
        }
        self
    }

    fn method(&self, method: &str) -> Option<&MethodFn<M>> {
        self.methods
            .iter()
            .find(|(name, _)| *name == method)
            .map(|(_, f)| f)
    }
}

impl<M: Module> ModuleSource for ModuleClass<M> {
    fn class_id(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<M>()
    }

    fn tags(&self) -> &TagStore {
        &self.tags
    }

    fn methods(&self) -> Vec<&'static str> {
        self.methods.iter().map(|(name, _)| *name).collect()
    }

    fn instantiate(&self) -> Result<ModuleInstance, BoxError> {
        (self.factory)().map(ModuleInstance::new)
    }

    fn bind(&self, instance: &ModuleInstance, method: &str) -> Option<Executor> {
        let this = instance.downcast::<M>()?;
        let f = self.method(method)?.clone();

        let mut executor = Executor::new(FnService::new(move |invocation| {
            f(this.clone(), invocation)
        }));
        for guard in self.guards.get(method).into_iter().flatten().rev() {
            executor = Executor::new(GuardLayer::new(guard.clone()).layer(executor));
        }
        Some(executor)
    }
}

fn command_method<M, F, Fut>(method: &'static str, f: F) -> MethodFn<M>
where
    M: Module,
    F: Fn(Arc<M>, Arc<Interaction>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |this: Arc<M>, invocation: Invocation| match invocation {
        Invocation::Command(interaction) => f(this, interaction).boxed(),
        other => mismatch(method, "command", &other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cordage_core::{CommandData, CommandSpec, InteractionData, User};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::error::{GuardRejected, InvocationMismatch};
    use crate::guard::guard_fn;

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Module for Counter {}

    fn ping() -> Invocation {
        let interaction = Interaction::new(
            1u64,
            User::new(2u64, "u"),
            InteractionData::Command(CommandData::new("ping")),
        );
        Invocation::Command(Arc::new(interaction))
    }

    fn counter_class() -> ModuleClass<Counter> {
        ModuleClass::from_default(ModuleOptions::new("counter")).slash_command(
            "ping",
            SlashCommandOptions::new(CommandSpec::new("ping", "Pong")),
            |this: Arc<Counter>, _| async move {
                this.calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
    }

    #[tokio::test]
    async fn test_bound_method_uses_the_given_instance() {
        let class = counter_class();
        let instance = class.instantiate().unwrap();
        let executor = class.bind(&instance, "ping").unwrap();

        executor.clone().oneshot(ping()).await.unwrap();
        executor.oneshot(ping()).await.unwrap();

        let counter = instance.downcast::<Counter>().unwrap();
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wrong_invocation_kind_is_an_error() {
        let class = counter_class();
        let instance = class.instantiate().unwrap();
        let executor = class.bind(&instance, "ping").unwrap();

        let event = Invocation::Event(Arc::new(GatewayEvent::new("ready", Value::Null)));
        let err = executor.oneshot(event).await.unwrap_err();
        let mismatch = err.downcast_ref::<InvocationMismatch>().unwrap();
        assert_eq!(mismatch.expected, "command");
        assert_eq!(mismatch.got, "event");
    }

    #[test]
    fn test_bind_rejects_foreign_instance_and_unknown_method() {
        #[derive(Default)]
        struct Other;
        impl Module for Other {}

        let class = counter_class();
        let foreign = ModuleInstance::new(Other);
        assert!(class.bind(&foreign, "ping").is_none());

        let instance = class.instantiate().unwrap();
        assert!(class.bind(&instance, "missing").is_none());
    }

    #[test]
    fn test_redeclare_replaces_handler_kind() {
        let class = counter_class().event(
            "ping",
            EventOptions::new("ready"),
            |_: Arc<Counter>, _| async { Ok(()) },
        );
        let target = TagTarget::Method(TypeId::of::<Counter>(), "ping");

        assert_eq!(class.tags().handler_kind(target), Some(TagKind::Event));
        assert!(!class.tags().has_tag(target, TagKind::SlashCommand));
        assert_eq!(class.methods(), ["ping"]);
    }

    #[tokio::test]
    async fn test_guards_run_in_declaration_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let first = order.clone();
        let second = order.clone();

        let class = counter_class()
            .guard(
                "ping",
                guard_fn("first", move |_| {
                    first.lock().push("first");
                    true
                }),
            )
            .guard(
                "ping",
                guard_fn("second", move |_| {
                    second.lock().push("second");
                    false
                }),
            );
        let instance = class.instantiate().unwrap();
        let executor = class.bind(&instance, "ping").unwrap();

        let err = executor.oneshot(ping()).await.unwrap_err();
        assert!(err.is::<GuardRejected>());
        assert_eq!(*order.lock(), ["first", "second"]);
        let counter = instance.downcast::<Counter>().unwrap();
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_factory_error_surfaces() {
        let class: ModuleClass<Counter> =
            ModuleClass::new(ModuleOptions::new("broken"), || Err("no database".into()));
        let err = class.instantiate().unwrap_err();
        assert_eq!(err.to_string(), "no database");
        assert_eq!(class.options().map(|o| o.name.as_str()), Some("broken"));
    }
}
