//! Keyed handler registries.
//!
//! One [`Registry`] exists per handler kind. Keys come from [`crate::key`], so
//! registration and lookup always derive them the same way. A later insert
//! under an existing key replaces the earlier entry and logs a warning; entries
//! are never merged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::handler::Executor;
use crate::key;
use crate::module::ModuleDescriptor;
use crate::options::{
    AutoCompleteOptions, ComponentOptions, EventOptions, SlashCommandOptions, SubCommandOptions,
    TextCommandOptions, ViewOptions,
};

/// A handler bound to its module instance.
#[derive(Clone)]
pub struct HandlerEntry<O> {
    /// Name of the owning module, resolved against the module registry at
    /// dispatch time.
    pub module: String,
    pub method: &'static str,
    pub executor: Executor,
    pub options: O,
}

impl<O: fmt::Debug> fmt::Debug for HandlerEntry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("module", &self.module)
            .field("method", &self.method)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

pub type EventEntry = HandlerEntry<EventOptions>;
pub type SlashCommandEntry = HandlerEntry<SlashCommandOptions>;
pub type SubCommandEntry = HandlerEntry<SubCommandOptions>;
pub type AutoCompleteEntry = HandlerEntry<AutoCompleteOptions>;
pub type ComponentEntry = HandlerEntry<ComponentOptions>;
pub type TextCommandEntry = HandlerEntry<TextCommandOptions>;

/// A component callback declared on a view.
#[derive(Clone)]
pub struct ViewEntry {
    pub view: ViewOptions,
    pub options: ComponentOptions,
    pub executor: Executor,
}

impl ViewEntry {
    /// Name of the module whose enabled flag governs the view.
    pub fn module(&self) -> &str {
        &self.view.module
    }

    /// Component options with the view-level settings folded in: flags are
    /// OR'd and the component's ttl wins over the view's.
    pub fn effective(&self) -> ComponentOptions {
        ComponentOptions {
            custom_id: self.options.custom_id.clone(),
            author_only: self.options.author_only || self.view.author_only,
            dev_only: self.options.dev_only || self.view.dev_only,
            ttl: self.options.ttl.or(self.view.ttl),
        }
    }
}

impl fmt::Debug for ViewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEntry")
            .field("view", &self.view)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// A last-write-wins map from composite key to entry.
pub struct Registry<E> {
    kind: &'static str,
    entries: RwLock<HashMap<String, Arc<E>>>,
}

impl<E> Registry<E> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts `entry` under `key`, returning the entry it replaced.
    pub fn insert(&self, key: impl Into<String>, entry: E) -> Option<Arc<E>> {
        let key = key.into();
        let previous = self.entries.write().insert(key.clone(), Arc::new(entry));
        if previous.is_some() {
            warn!(registry = self.kind, key = %key, "Duplicate key, last registration wins");
        } else {
            trace!(registry = self.kind, key = %key, "Registered entry");
        }
        previous
    }

    pub fn get(&self, key: &str) -> Option<Arc<E>> {
        self.entries.read().get(key).cloned()
    }

    /// Looks up the most specific entry whose key is a `_`-segment prefix of
    /// `key`.
    pub fn resolve_most_specific(&self, key: &str) -> Option<(String, Arc<E>)> {
        let entries = self.entries.read();
        key::prefixes(key).find_map(|prefix| {
            entries
                .get(prefix)
                .map(|entry| (prefix.to_string(), entry.clone()))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Arc<E>> {
        self.entries.write().remove(key)
    }

    /// Snapshot of every `(key, entry)` pair.
    pub fn entries(&self) -> Vec<(String, Arc<E>)> {
        self.entries
            .read()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Snapshot of every entry.
    pub fn values(&self) -> Vec<Arc<E>> {
        self.entries.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<O> Registry<HandlerEntry<O>> {
    /// Every entry owned by `module`.
    pub fn owned_by(&self, module: &str) -> Vec<(String, Arc<HandlerEntry<O>>)> {
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.module == module)
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }
}

impl<E> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}

// ─── Registries ──────────────────────────────────────────────────────────────

/// The full set of registries owned by a client.
#[derive(Debug)]
pub struct Registries {
    pub modules: Registry<ModuleDescriptor>,
    pub events: Registry<EventEntry>,
    pub slash_commands: Registry<SlashCommandEntry>,
    pub sub_commands: Registry<SubCommandEntry>,
    pub auto_completes: Registry<AutoCompleteEntry>,
    pub components: Registry<ComponentEntry>,
    pub text_commands: Registry<TextCommandEntry>,
    pub views: Registry<ViewEntry>,
}

impl Registries {
    pub fn new() -> Self {
        Self {
            modules: Registry::new("modules"),
            events: Registry::new("events"),
            slash_commands: Registry::new("slash_commands"),
            sub_commands: Registry::new("sub_commands"),
            auto_completes: Registry::new("auto_completes"),
            components: Registry::new("components"),
            text_commands: Registry::new("text_commands"),
            views: Registry::new("views"),
        }
    }

    /// Whether `module` exists and is enabled.
    pub fn is_enabled(&self, module: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|descriptor| descriptor.is_enabled())
    }

    pub fn stats(&self) -> RegistryCounts {
        RegistryCounts {
            modules: self.modules.len(),
            events: self.events.len(),
            slash_commands: self.slash_commands.len(),
            sub_commands: self.sub_commands.len(),
            auto_completes: self.auto_completes.len(),
            components: self.components.len(),
            text_commands: self.text_commands.len(),
            views: self.views.len(),
        }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry counts per registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCounts {
    pub modules: usize,
    pub events: usize,
    pub slash_commands: usize,
    pub sub_commands: usize,
    pub auto_completes: usize,
    pub components: usize,
    pub text_commands: usize,
    pub views: usize,
}

impl fmt::Display for RegistryCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "modules: {}, events: {}, slash: {}, sub: {}, autocomplete: {}, components: {}, text: {}, views: {}",
            self.modules,
            self.events,
            self.slash_commands,
            self.sub_commands,
            self.auto_completes,
            self.components,
            self.text_commands,
            self.views
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let registry: Registry<&str> = Registry::new("test");
        assert!(registry.insert("ping", "first").is_none());
        let previous = registry.insert("ping", "second");

        assert_eq!(previous.as_deref(), Some(&"first"));
        assert_eq!(registry.get("ping").as_deref(), Some(&"second"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_most_specific() {
        let registry: Registry<&str> = Registry::new("test");
        registry.insert("tag", "any");
        registry.insert("tag_admin", "admin group");

        let (key, entry) = registry.resolve_most_specific("tag_admin_remove").unwrap();
        assert_eq!((key.as_str(), *entry), ("tag_admin", "admin group"));

        let (key, entry) = registry.resolve_most_specific("tag_show").unwrap();
        assert_eq!((key.as_str(), *entry), ("tag", "any"));

        assert!(registry.resolve_most_specific("other_show").is_none());
    }

    #[test]
    fn test_view_flags_combine() {
        use std::time::Duration;

        use crate::guard::FnService;

        let entry = ViewEntry {
            view: ViewOptions::new("shop")
                .author_only(true)
                .ttl(Duration::from_secs(60)),
            options: ComponentOptions::new("buy").dev_only(true),
            executor: Executor::new(FnService::new(|_| async { Ok::<_, tower::BoxError>(()) })),
        };
        let effective = entry.effective();

        assert!(effective.author_only);
        assert!(effective.dev_only);
        assert_eq!(effective.ttl, Some(Duration::from_secs(60)));
        assert_eq!(entry.module(), "shop");
    }
}
