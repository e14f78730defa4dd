//! Module and view collection.
//!
//! The collector turns [`ModuleSource`]s and [`View`]s into registry entries.
//! Sources come either from an explicit list or from the link-time slices
//! that `#[register_module]` and `#[register_view]` populate:
//!
//! ```rust,ignore
//! #[register_module]
//! fn greeter() -> ModuleClass<Greeter> {
//!     ModuleClass::from_default(ModuleOptions::new("greeter"))
//! }
//!
//! let report = client.collect(CollectSource::Auto).await;
//! ```
//!
//! Modules load concurrently. A module that fails to instantiate, load or
//! bind is reported and skipped; the others are unaffected.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use linkme::distributed_slice;
use tracing::{debug, error, info};

use crate::error::CollectError;
use crate::events::EventBus;
use crate::handler::Executor;
use crate::key;
use crate::module::{ModuleDescriptor, ModuleSource};
use crate::registry::{HandlerEntry, Registries};
use crate::tag::{Tag, TagKind, TagTarget};
use crate::view::View;

/// Factory stored in [`MODULE_SOURCES`].
pub type ModuleSourceFn = fn() -> Arc<dyn ModuleSource>;

/// Factory stored in [`VIEW_SOURCES`].
pub type ViewSourceFn = fn() -> View;

/// Module classes registered with `#[register_module]`.
#[distributed_slice]
pub static MODULE_SOURCES: [ModuleSourceFn];

/// Views registered with `#[register_view]`.
#[distributed_slice]
pub static VIEW_SOURCES: [ViewSourceFn];

/// Explicitly listed modules and views.
#[derive(Default)]
pub struct Sources {
    modules: Vec<Arc<dyn ModuleSource>>,
    views: Vec<View>,
}

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, source: impl ModuleSource) -> Self {
        self.modules.push(Arc::new(source));
        self
    }

    pub fn view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }
}

/// Where the collector looks for definitions.
pub enum CollectSource {
    /// Everything registered in the link-time slices.
    Auto,
    /// Only the given sources.
    Explicit(Sources),
}

impl From<Sources> for CollectSource {
    fn from(sources: Sources) -> Self {
        Self::Explicit(sources)
    }
}

/// Outcome of one collection run.
#[derive(Debug, Default)]
pub struct CollectReport {
    /// Names of the modules that loaded.
    pub loaded: Vec<String>,
    /// Type names of discovered sources that carry no module tag.
    pub skipped: Vec<&'static str>,
    pub failed: Vec<CollectError>,
    /// Number of view components registered.
    pub view_components: usize,
}

impl CollectReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for CollectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} module(s) loaded, {} skipped, {} failed, {} view component(s)",
            self.loaded.len(),
            self.skipped.len(),
            self.failed.len(),
            self.view_components
        )
    }
}

fn module_tag(source: &dyn ModuleSource) -> Option<&crate::options::ModuleOptions> {
    match source
        .tags()
        .read_tag(TagTarget::Class(source.class_id()), TagKind::Module)
    {
        Some(Tag::Module(options)) => Some(options),
        _ => None,
    }
}

// ─── Collector ───────────────────────────────────────────────────────────────

/// Fills a client's registries and attaches event listeners.
pub struct Collector<'a> {
    registries: &'a Registries,
    events: &'a EventBus,
}

impl<'a> Collector<'a> {
    pub fn new(registries: &'a Registries, events: &'a EventBus) -> Self {
        Self { registries, events }
    }

    pub async fn collect(&self, source: CollectSource) -> CollectReport {
        let (modules, views, mut skipped) = match source {
            CollectSource::Auto => {
                let mut skipped = Vec::new();
                let modules = MODULE_SOURCES
                    .iter()
                    .map(|factory| factory())
                    .filter(|source| {
                        let tagged = module_tag(source.as_ref()).is_some();
                        if !tagged {
                            debug!(source = source.type_name(), "Discovered source has no module tag, skipped");
                            skipped.push(source.type_name());
                        }
                        tagged
                    })
                    .collect::<Vec<_>>();
                let views = VIEW_SOURCES.iter().map(|factory| factory()).collect();
                (modules, views, skipped)
            }
            CollectSource::Explicit(sources) => (sources.modules, sources.views, Vec::new()),
        };

        let mut report = self.collect_modules(modules).await;
        report.skipped.append(&mut skipped);
        for view in views {
            report.view_components += self.collect_view(view);
        }
        info!(%report, "Collection finished");
        report
    }

    /// Loads every module concurrently. Failures are isolated per module.
    pub async fn collect_modules(&self, sources: Vec<Arc<dyn ModuleSource>>) -> CollectReport {
        let results = join_all(sources.iter().map(|source| self.load_module(source.as_ref()))).await;

        let mut report = CollectReport::default();
        for result in results {
            match result {
                Ok(name) => report.loaded.push(name),
                Err(e) => {
                    error!(error = %e, "Module failed to load");
                    report.failed.push(e);
                }
            }
        }
        report
    }

    /// Registers every component of `view`, returning how many.
    pub fn collect_view(&self, view: View) -> usize {
        let module = view.options().module.clone();
        let mut count = 0;
        for (key, entry) in view.into_entries() {
            self.registries.views.insert(key, entry);
            count += 1;
        }
        debug!(module = %module, components = count, "View collected");
        count
    }

    async fn load_module(&self, source: &dyn ModuleSource) -> Result<String, CollectError> {
        let options = module_tag(source)
            .cloned()
            .ok_or(CollectError::NotAModule {
                type_name: source.type_name(),
            })?;
        let name = options.name;
        let class = source.class_id();

        let instance = source.instantiate().map_err(|source| CollectError::Instantiate {
            module: name.clone(),
            source,
        })?;
        instance
            .hooks()
            .on_load()
            .await
            .map_err(|source| CollectError::Load {
                module: name.clone(),
                source,
            })?;

        // Registries are written only once every method has bound.
        let mut bound = Vec::new();
        for method in source.methods() {
            let Some(kind) = source.tags().handler_kind(TagTarget::Method(class, method)) else {
                continue;
            };
            let Some(tag) = source.tags().read_tag(TagTarget::Method(class, method), kind) else {
                continue;
            };
            let executor = source.bind(&instance, method).ok_or(CollectError::Bind {
                module: name.clone(),
                method,
            })?;
            bound.push((method, tag.clone(), executor));
        }

        self.registries.modules.insert(
            name.clone(),
            ModuleDescriptor::new(name.clone(), options.dev_only, class, instance),
        );
        let handlers = bound.len();
        for (method, tag, executor) in bound {
            self.register(&name, method, tag, executor);
        }
        info!(module = %name, handlers, "Module loaded");
        Ok(name)
    }

    fn register(&self, module: &str, method: &'static str, tag: Tag, executor: Executor) {
        let registries = self.registries;
        macro_rules! entry {
            ($options:expr) => {
                HandlerEntry {
                    module: module.to_string(),
                    method,
                    executor,
                    options: $options,
                }
            };
        }

        match tag {
            Tag::Event(options) => {
                let key = key::event(module, &options.name);
                let event = options.name.clone();
                let once = options.once;
                let entry = entry!(options);
                if once {
                    self.events.once(&event, key.clone(), entry.executor.clone());
                } else {
                    self.events.on(&event, key.clone(), entry.executor.clone());
                }
                registries.events.insert(key, entry);
            }
            Tag::SlashCommand(options) => {
                registries
                    .slash_commands
                    .insert(key::slash_command(&options.spec.name), entry!(options));
            }
            Tag::SubCommand(options) => {
                let key = key::composite(&options.parent, options.group.as_deref(), Some(&options.name));
                registries.sub_commands.insert(key, entry!(options));
            }
            Tag::AutoComplete(options) => {
                let key = key::composite(&options.parent, options.group.as_deref(), options.name.as_deref());
                registries.auto_completes.insert(key, entry!(options));
            }
            Tag::Component(options) => {
                let key = key::component(&options.custom_id).to_string();
                registries.components.insert(key, entry!(options));
            }
            Tag::TextCommand(options) => {
                registries
                    .text_commands
                    .insert(key::text_command(&options.name), entry!(options));
            }
            Tag::Module(_) => {
                debug!(module, method, "Class-level tag on a method ignored");
            }
        }
    }
}
