//! Runtime enable/disable of collected modules.
//!
//! Disabling a module keeps its registry entries; routers reject its
//! handlers until it is enabled again. Its event listeners are detached from
//! the bus and its slash commands are withdrawn from the remote API.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::Client;
use crate::error::{LifecycleError, LifecycleResult};
use crate::module::{Module, ModuleDescriptor};
use crate::sync::{SyncMode, SyncReport};

/// Identifies a module by name or by class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKey {
    Name(String),
    Class(TypeId),
}

impl ModuleKey {
    pub fn of<M: Module>() -> Self {
        Self::Class(TypeId::of::<M>())
    }
}

impl From<&str> for ModuleKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ModuleKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Class(id) => write!(f, "{id:?}"),
        }
    }
}

/// What an enable or disable call did.
#[derive(Debug)]
pub enum LifecycleChange {
    /// The module was already in the requested state.
    Unchanged,
    Enabled { sync: SyncReport },
    Disabled { sync: SyncReport },
}

impl LifecycleChange {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl Client {
    /// Looks a module descriptor up by name or class.
    pub fn find_module(&self, key: &ModuleKey) -> Option<Arc<ModuleDescriptor>> {
        let modules = &self.registries().modules;
        match key {
            ModuleKey::Name(name) => modules.get(name),
            ModuleKey::Class(id) => modules
                .values()
                .into_iter()
                .find(|descriptor| descriptor.class_id() == *id),
        }
    }

    /// Enables a module, re-attaching its listeners and merging its commands
    /// back into the remote command list.
    pub async fn enable_module(self: &Arc<Self>, key: impl Into<ModuleKey>) -> LifecycleResult<LifecycleChange> {
        let descriptor = self.lookup(key.into())?;
        let name = descriptor.name().to_string();
        if descriptor.is_enabled() {
            warn!(module = %name, "Module is already enabled");
            return Ok(LifecycleChange::Unchanged);
        }

        descriptor
            .instance()
            .hooks()
            .on_enable()
            .await
            .map_err(|source| LifecycleError::Hook {
                module: name.clone(),
                hook: "on_enable",
                source,
            })?;
        descriptor.set_enabled(true);

        for (key, entry) in self.registries().events.owned_by(&name) {
            if entry.options.once {
                self.events().once(&entry.options.name, key, entry.executor.clone());
            } else {
                self.events().on(&entry.options.name, key, entry.executor.clone());
            }
        }

        let sync = self.synchronize_module(&name, SyncMode::Merge).await;
        info!(module = %name, %sync, "Module enabled");
        Ok(LifecycleChange::Enabled { sync })
    }

    /// Disables a module, detaching its listeners and removing its commands
    /// from the remote command list.
    pub async fn disable_module(self: &Arc<Self>, key: impl Into<ModuleKey>) -> LifecycleResult<LifecycleChange> {
        let descriptor = self.lookup(key.into())?;
        let name = descriptor.name().to_string();
        if !descriptor.is_enabled() {
            warn!(module = %name, "Module is already disabled");
            return Ok(LifecycleChange::Unchanged);
        }

        descriptor
            .instance()
            .hooks()
            .on_disable()
            .await
            .map_err(|source| LifecycleError::Hook {
                module: name.clone(),
                hook: "on_disable",
                source,
            })?;
        descriptor.set_enabled(false);

        for (key, _) in self.registries().events.owned_by(&name) {
            self.events().off(&key);
        }

        let sync = self.synchronize_module(&name, SyncMode::Remove).await;
        info!(module = %name, %sync, "Module disabled");
        Ok(LifecycleChange::Disabled { sync })
    }

    fn lookup(&self, key: ModuleKey) -> LifecycleResult<Arc<ModuleDescriptor>> {
        self.find_module(&key)
            .ok_or_else(|| LifecycleError::ModuleNotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use cordage_core::{CommandSpec, GatewayEvent, names};
    use futures::future::join_all;
    use serde_json::Value;

    use crate::client::ClientOptions;
    use crate::collector::Sources;
    use crate::handler::HandlerResult;
    use crate::module::ModuleClass;
    use crate::options::{EventOptions, ModuleOptions, SlashCommandOptions};
    use crate::testing::MockApi;

    #[derive(Default)]
    struct Music {
        joins: AtomicUsize,
        refuse_enable: AtomicBool,
    }

    #[async_trait]
    impl Module for Music {
        async fn on_enable(&self) -> HandlerResult {
            if self.refuse_enable.load(Ordering::SeqCst) {
                return Err("voice backend offline".into());
            }
            Ok(())
        }
    }

    fn music() -> ModuleClass<Music> {
        ModuleClass::from_default(ModuleOptions::new("music"))
            .slash_command(
                "play",
                SlashCommandOptions::new(CommandSpec::new("play", "Play a track")),
                |_: Arc<Music>, _| async { Ok(()) },
            )
            .event(
                "on_member_join",
                EventOptions::new(names::GUILD_MEMBER_ADD),
                |this: Arc<Music>, _| async move {
                    this.joins.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            )
    }

    async fn setup() -> (Arc<Client>, Arc<MockApi>) {
        let api = Arc::new(MockApi::new());
        api.set_global(vec![CommandSpec::new("other", "Owned elsewhere")]);
        let client = Arc::new(Client::new(ClientOptions::new("test"), api.clone()));
        client.collect(Sources::new().module(music()).into()).await;
        (client, api)
    }

    fn remote_names(api: &MockApi) -> Vec<String> {
        let mut names: Vec<_> = api.global().into_iter().map(|c| c.name).collect();
        names.sort();
        names
    }

    async fn member_join(client: &Client) {
        join_all(client.emit(GatewayEvent::new(names::GUILD_MEMBER_ADD, Value::Null))).await;
    }

    fn joins(client: &Client) -> usize {
        client
            .find_module(&ModuleKey::of::<Music>())
            .and_then(|descriptor| descriptor.instance().downcast::<Music>())
            .map_or(0, |music| music.joins.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_disable_then_enable_round_trip() {
        let (client, api) = setup().await;

        let change = client.disable_module("music").await.unwrap();
        assert!(matches!(change, LifecycleChange::Disabled { ref sync } if sync.is_success()));
        assert_eq!(remote_names(&api), ["other"]);
        member_join(&client).await;
        assert_eq!(joins(&client), 0);
        assert!(client.registries().slash_commands.contains("play"));

        let change = client.enable_module(ModuleKey::of::<Music>()).await.unwrap();
        assert!(change.is_changed());
        assert_eq!(remote_names(&api), ["other", "play"]);
        member_join(&client).await;
        assert_eq!(joins(&client), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_unchanged() {
        let (client, api) = setup().await;

        let change = client.enable_module("music").await.unwrap();
        assert!(matches!(change, LifecycleChange::Unchanged));
        assert_eq!(api.replace_calls(), 0);

        client.disable_module("music").await.unwrap();
        let calls = api.replace_calls();
        let change = client.disable_module("music").await.unwrap();
        assert!(matches!(change, LifecycleChange::Unchanged));
        assert_eq!(api.replace_calls(), calls);
    }

    #[tokio::test]
    async fn test_unknown_module() {
        let (client, _) = setup().await;
        let err = client.enable_module("radio").await.unwrap_err();
        assert!(matches!(err, LifecycleError::ModuleNotFound(name) if name == "radio"));
    }

    #[tokio::test]
    async fn test_failing_hook_leaves_state_unchanged() {
        let (client, _) = setup().await;
        client.disable_module("music").await.unwrap();
        let descriptor = client.find_module(&"music".into()).unwrap();
        descriptor
            .instance()
            .downcast::<Music>()
            .unwrap()
            .refuse_enable
            .store(true, Ordering::SeqCst);

        let err = client.enable_module("music").await.unwrap_err();

        assert!(matches!(err, LifecycleError::Hook { hook: "on_enable", .. }));
        assert!(!descriptor.is_enabled());
        assert_eq!(client.events().listener_count(names::GUILD_MEMBER_ADD), 0);
    }
}
