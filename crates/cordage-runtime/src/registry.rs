//! Registry of the bots a runtime manages.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::bot::{BotStatus, ManagedBot};
use crate::error::{RuntimeError, RuntimeResult};

/// Bots keyed by lowercased name.
#[derive(Default)]
pub struct BotRegistry {
    bots: RwLock<HashMap<String, Arc<ManagedBot>>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bot. Names are unique ignoring case.
    pub fn insert(&self, bot: ManagedBot) -> RuntimeResult<Arc<ManagedBot>> {
        let key = bot.name().to_lowercase();
        let mut bots = self.bots.write();
        if bots.contains_key(&key) {
            return Err(RuntimeError::BotExists(key));
        }

        let bot = Arc::new(bot);
        bots.insert(key.clone(), Arc::clone(&bot));
        info!(bot = %key, "Registered bot");
        Ok(bot)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ManagedBot>> {
        self.bots.read().get(&name.to_lowercase()).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<ManagedBot>> {
        self.bots.write().remove(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.bots.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn values(&self) -> Vec<Arc<ManagedBot>> {
        self.bots.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.read().is_empty()
    }

    /// Current status of every bot.
    pub fn status_all(&self) -> HashMap<String, BotStatus> {
        self.bots
            .read()
            .iter()
            .map(|(name, bot)| (name.clone(), bot.status()))
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let bots = self.bots.read();
        let mut stats = RegistryStats {
            total: bots.len(),
            ..Default::default()
        };

        for bot in bots.values() {
            match bot.status() {
                BotStatus::Registered => stats.registered += 1,
                BotStatus::Connected => stats.connected += 1,
                BotStatus::Disconnected => stats.disconnected += 1,
                BotStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

/// Statistics about the bot registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub registered: usize,
    pub connected: usize,
    pub disconnected: usize,
    pub failed: usize,
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bots: {} total ({} registered, {} connected, {} disconnected, {} failed)",
            self.total, self.registered, self.connected, self.disconnected, self.failed
        )
    }
}
