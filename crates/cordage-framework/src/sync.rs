//! Remote command synchronization.
//!
//! The remote API only offers bulk replacement, so every mode ends in one
//! replace call per scope:
//!
//! | mode      | global / per-guild payload                         |
//! |-----------|----------------------------------------------------|
//! | `Replace` | the local set                                      |
//! | `Merge`   | remote set minus local names, plus the local set   |
//! | `Remove`  | remote set minus local names                       |
//!
//! Scope calls run concurrently and settle independently; a failing scope is
//! logged and reported without affecting its siblings.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use cordage_core::{ApiError, ApiResult, CommandApi, CommandSpec, Snowflake};
use futures::future::join_all;
use tracing::{Instrument, debug, debug_span, error, info, warn};

use crate::client::Client;
use crate::options::SyncTarget;
use crate::registry::SlashCommandEntry;

/// Which remote scopes synchronization may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncScopes {
    pub global: bool,
    pub guild: bool,
}

impl Default for SyncScopes {
    fn default() -> Self {
        Self {
            global: true,
            guild: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Publish the local set as the whole remote set.
    Replace,
    /// Add or update the local set, keeping other remote commands.
    Merge,
    /// Remove the local set by name, keeping other remote commands.
    Remove,
}

/// One remote command scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyncScope {
    Global,
    Guild(Snowflake),
}

impl fmt::Display for SyncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild(id) => write!(f, "guild {id}"),
        }
    }
}

/// Commands split by destination scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPartition {
    pub global: Vec<CommandSpec>,
    pub guilds: BTreeMap<Snowflake, Vec<CommandSpec>>,
}

impl CommandPartition {
    /// Files `spec` under every scope `target` names.
    pub fn push(&mut self, spec: &CommandSpec, target: &SyncTarget) {
        if target.global {
            self.global.push(spec.clone());
        }
        for guild in &target.guilds {
            self.guilds.entry(*guild).or_default().push(spec.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.guilds.values().all(Vec::is_empty)
    }
}

/// Result of one synchronization run.
#[derive(Debug)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub succeeded: Vec<SyncScope>,
    pub failed: Vec<(SyncScope, ApiError)>,
    /// Commands left out because their sync resolver failed.
    pub skipped: Vec<String>,
}

impl SyncReport {
    fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// No scope call failed and no command was skipped.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {} scope(s) synced, {} failed, {} command(s) skipped",
            self.mode,
            self.succeeded.len(),
            self.failed.len(),
            self.skipped.len()
        )
    }
}

/// `remote` without the commands named in `names`.
pub fn retain_unnamed(remote: Vec<CommandSpec>, names: &HashSet<&str>) -> Vec<CommandSpec> {
    remote
        .into_iter()
        .filter(|command| !names.contains(command.name.as_str()))
        .collect()
}

// ─── Synchronizer ────────────────────────────────────────────────────────────

/// Publishes partitions through a [`CommandApi`].
pub struct Synchronizer {
    api: Arc<dyn CommandApi>,
    scopes: SyncScopes,
}

impl Synchronizer {
    pub fn new(api: Arc<dyn CommandApi>, scopes: SyncScopes) -> Self {
        Self { api, scopes }
    }

    /// Resolves each entry's sync policy concurrently and partitions the
    /// commands. Entries whose resolver fails are returned by name.
    pub async fn partition(
        client: &Arc<Client>,
        entries: &[Arc<SlashCommandEntry>],
    ) -> (CommandPartition, Vec<String>) {
        let resolved = join_all(entries.iter().map(|entry| {
            let client = client.clone();
            async move {
                let target = match &entry.options.sync {
                    Some(policy) => policy.resolve(client).await,
                    None => Ok(SyncTarget::global()),
                };
                (entry, target)
            }
        }))
        .await;

        let mut partition = CommandPartition::default();
        let mut skipped = Vec::new();
        for (entry, target) in resolved {
            let spec = &entry.options.spec;
            match target {
                Ok(target) => partition.push(spec, &target),
                Err(e) => {
                    error!(command = %spec.name, error = %e, "Sync resolver failed, command skipped");
                    skipped.push(spec.name.clone());
                }
            }
        }
        (partition, skipped)
    }

    /// Applies `partition` in `mode`, one call per enabled scope.
    pub async fn apply(&self, partition: &CommandPartition, mode: SyncMode) -> SyncReport {
        let mut calls: Vec<(SyncScope, &[CommandSpec])> = Vec::new();
        if self.scopes.global && (mode == SyncMode::Replace || !partition.global.is_empty()) {
            calls.push((SyncScope::Global, partition.global.as_slice()));
        }
        if self.scopes.guild {
            for (guild, commands) in &partition.guilds {
                calls.push((SyncScope::Guild(*guild), commands.as_slice()));
            }
        }

        let span = debug_span!("sync", mode = ?mode, scopes = calls.len());
        let results = join_all(
            calls
                .into_iter()
                .map(|(scope, commands)| async move { (scope, self.sync_scope(scope, commands, mode).await) }),
        )
        .instrument(span)
        .await;

        let mut report = SyncReport::new(mode);
        for (scope, result) in results {
            match result {
                Ok(()) => report.succeeded.push(scope),
                Err(e) => {
                    error!(%scope, error = %e, "Command synchronization failed");
                    report.failed.push((scope, e));
                }
            }
        }
        report
    }

    async fn sync_scope(&self, scope: SyncScope, commands: &[CommandSpec], mode: SyncMode) -> ApiResult<()> {
        let payload = match mode {
            SyncMode::Replace => commands.to_vec(),
            SyncMode::Merge | SyncMode::Remove => {
                let names: HashSet<&str> = commands.iter().map(|c| c.name.as_str()).collect();
                let remote = self.fetch(scope).await?;
                let before = remote.len();
                let mut kept = retain_unnamed(remote, &names);
                if mode == SyncMode::Remove {
                    if kept.len() == before {
                        debug!(%scope, "Nothing to remove");
                        return Ok(());
                    }
                } else {
                    kept.extend_from_slice(commands);
                }
                kept
            }
        };

        let count = payload.len();
        match scope {
            SyncScope::Global => self.api.replace_global_commands(payload).await?,
            SyncScope::Guild(guild) => self.api.replace_guild_commands(guild, payload).await?,
        };
        info!(%scope, commands = count, "Commands synchronized");
        Ok(())
    }

    async fn fetch(&self, scope: SyncScope) -> ApiResult<Vec<CommandSpec>> {
        match scope {
            SyncScope::Global => self.api.get_global_commands().await,
            SyncScope::Guild(guild) => self.api.get_guild_commands(guild).await,
        }
    }
}

impl Client {
    /// Publishes every slash command in replace mode.
    pub async fn synchronize_commands(self: &Arc<Self>) -> SyncReport {
        let entries = self.registries().slash_commands.values();
        self.synchronize(&entries, SyncMode::Replace).await
    }

    /// Synchronizes only the slash commands owned by `module`.
    pub async fn synchronize_module(self: &Arc<Self>, module: &str, mode: SyncMode) -> SyncReport {
        let entries: Vec<_> = self
            .registries()
            .slash_commands
            .owned_by(module)
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        if entries.is_empty() {
            debug!(module, "Module has no slash commands to synchronize");
            return SyncReport::new(mode);
        }
        self.synchronize(&entries, mode).await
    }

    async fn synchronize(self: &Arc<Self>, entries: &[Arc<SlashCommandEntry>], mode: SyncMode) -> SyncReport {
        let (partition, skipped) = Synchronizer::partition(self, entries).await;
        let synchronizer = Synchronizer::new(self.api().clone(), self.options().sync);
        let mut report = synchronizer.apply(&partition, mode).await;
        report.skipped = skipped;
        if !report.failed.is_empty() {
            warn!(%report, "Command synchronization finished with failures");
        } else {
            debug!(%report, "Command synchronization finished");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::MockApi;

    fn spec(name: &str) -> CommandSpec {
        CommandSpec::new(name, "test")
    }

    fn names(commands: &[CommandSpec]) -> Vec<&str> {
        commands.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_retain_unnamed() {
        let remote = vec![spec("a"), spec("b"), spec("c")];
        let kept = retain_unnamed(remote, &HashSet::from(["b"]));
        assert_eq!(names(&kept), ["a", "c"]);

        let kept = retain_unnamed(kept, &HashSet::from(["zzz"]));
        assert_eq!(names(&kept), ["a", "c"]);
    }

    #[test]
    fn test_partition_by_target() {
        let mut partition = CommandPartition::default();
        partition.push(&spec("ping"), &SyncTarget::global());
        partition.push(&spec("admin"), &SyncTarget::guilds([7u64, 9]));
        partition.push(&spec("both"), &SyncTarget { global: true, guilds: vec![Snowflake::new(7)] });

        assert_eq!(names(&partition.global), ["ping", "both"]);
        assert_eq!(names(&partition.guilds[&Snowflake::new(7)]), ["admin", "both"]);
        assert_eq!(names(&partition.guilds[&Snowflake::new(9)]), ["admin"]);
    }

    #[tokio::test]
    async fn test_replace_publishes_every_scope() {
        let api = Arc::new(MockApi::new());
        let mut partition = CommandPartition::default();
        partition.push(&spec("ping"), &SyncTarget::global());
        partition.push(&spec("admin"), &SyncTarget::guilds([7u64]));

        let report = Synchronizer::new(api.clone(), SyncScopes::default())
            .apply(&partition, SyncMode::Replace)
            .await;

        assert!(report.is_success());
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(names(&api.global()), ["ping"]);
        assert_eq!(names(&api.guild(7u64)), ["admin"]);
    }

    #[tokio::test]
    async fn test_disabled_scope_is_not_touched() {
        let api = Arc::new(MockApi::new());
        let mut partition = CommandPartition::default();
        partition.push(&spec("admin"), &SyncTarget::guilds([7u64]));

        let scopes = SyncScopes {
            global: true,
            guild: false,
        };
        let report = Synchronizer::new(api.clone(), scopes)
            .apply(&partition, SyncMode::Replace)
            .await;

        assert_eq!(report.succeeded, [SyncScope::Global]);
        assert!(api.guild(7u64).is_empty());
    }

    #[tokio::test]
    async fn test_remove_keeps_unnamed_remote_commands() {
        let api = Arc::new(MockApi::new());
        api.set_global(vec![spec("a"), spec("b"), spec("c")]);
        let partition = CommandPartition {
            global: vec![spec("b")],
            ..Default::default()
        };

        let report = Synchronizer::new(api.clone(), SyncScopes::default())
            .apply(&partition, SyncMode::Remove)
            .await;

        assert!(report.is_success());
        assert_eq!(names(&api.global()), ["a", "c"]);
    }

    #[tokio::test]
    async fn test_remove_absent_name_is_noop() {
        let api = Arc::new(MockApi::new());
        api.set_global(vec![spec("a")]);
        let partition = CommandPartition {
            global: vec![spec("gone")],
            ..Default::default()
        };

        Synchronizer::new(api.clone(), SyncScopes::default())
            .apply(&partition, SyncMode::Remove)
            .await;

        assert_eq!(names(&api.global()), ["a"]);
        assert_eq!(api.replace_calls(), 0);
    }

    #[tokio::test]
    async fn test_merge_updates_in_place() {
        let api = Arc::new(MockApi::new());
        api.set_global(vec![spec("a"), CommandSpec::new("b", "old")]);
        let partition = CommandPartition {
            global: vec![CommandSpec::new("b", "new")],
            ..Default::default()
        };

        Synchronizer::new(api.clone(), SyncScopes::default())
            .apply(&partition, SyncMode::Merge)
            .await;

        let global = api.global();
        assert_eq!(names(&global), ["a", "b"]);
        assert_eq!(global[1].description, "new");
    }

    #[tokio::test]
    async fn test_failed_scope_does_not_abort_siblings() {
        let api = Arc::new(MockApi::new());
        api.fail_guild(7u64);
        let mut partition = CommandPartition::default();
        partition.push(&spec("ping"), &SyncTarget::global());
        partition.push(&spec("admin"), &SyncTarget::guilds([7u64, 9]));

        let report = Synchronizer::new(api.clone(), SyncScopes::default())
            .apply(&partition, SyncMode::Replace)
            .await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, SyncScope::Guild(Snowflake::new(7)));
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(names(&api.guild(9u64)), ["admin"]);
    }
}
