//! Runtime orchestration of one or more bots.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cordage_runtime::CordageRuntime;
//!
//! // Auto-loads cordage.toml from the current directory
//! let runtime = CordageRuntime::new();
//! runtime.register_bot("main", Arc::new(MyGateway::new()))?;
//! runtime.run().await?;
//!
//! // Custom configuration
//! let runtime = CordageRuntime::builder()
//!     .config_file("config/cordage.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cordage_core::{ClientError, Gateway};
use cordage_framework::{Client, Sources};
use futures::future::join_all;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bot::{BotStatus, ManagedBot};
use crate::config::{ConfigLoader, ConfigResult, CordageConfig, PRIMARY_BOT};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::registry::{BotRegistry, RegistryStats};

/// Owns the configuration and every registered bot.
///
/// ```rust,ignore
/// let runtime = CordageRuntime::new();
/// let client = runtime.register_bot("main", gateway)?;
/// runtime.run().await?;
/// ```
pub struct CordageRuntime {
    config: CordageConfig,
    registry: BotRegistry,
    shutdown: CancellationToken,
    running: AtomicBool,
}

impl CordageRuntime {
    /// Creates a runtime from the configuration found in the current
    /// directory, falling back to defaults.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                CordageConfig::default()
            });

        Self::from_config(&config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging.
    pub fn from_config(config: &CordageConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            bots = config.bots.len() + 1,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            registry: BotRegistry::new(),
            shutdown: CancellationToken::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &CordageConfig {
        &self.config
    }

    pub fn registry(&self) -> &BotRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Registers the bot configured under `name`. Handlers are collected
    /// automatically on start when `collector.auto` is set.
    pub fn register_bot(&self, name: &str, gateway: Arc<dyn Gateway>) -> RuntimeResult<Arc<Client>> {
        self.register(name, gateway, None)
    }

    /// Registers the bot configured under `name` with explicit sources.
    pub fn register_bot_with(
        &self,
        name: &str,
        gateway: Arc<dyn Gateway>,
        sources: Sources,
    ) -> RuntimeResult<Arc<Client>> {
        self.register(name, gateway, Some(sources))
    }

    fn register(
        &self,
        name: &str,
        gateway: Arc<dyn Gateway>,
        sources: Option<Sources>,
    ) -> RuntimeResult<Arc<Client>> {
        let config = self
            .config
            .bot_config(name)
            .ok_or_else(|| RuntimeError::BotNotFound(name.to_string()))?
            .clone();

        let bot = self
            .registry
            .insert(ManagedBot::new(name.to_lowercase(), config, gateway, sources))?;
        Ok(bot.client().clone())
    }

    /// The client of a registered bot.
    pub fn client(&self, name: &str) -> Option<Arc<Client>> {
        self.registry.get(name).map(|bot| bot.client().clone())
    }

    /// Starts every registered bot, the primary one first.
    ///
    /// Failures of the primary bot are returned. Secondary bots that fail
    /// are logged and marked [`BotStatus::Failed`].
    pub async fn start(&self) -> RuntimeResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Runtime is already running");
            return Ok(());
        }

        info!(bots = self.registry.len(), "Starting Cordage runtime");

        let mut bots = self.registry.values();
        bots.sort_by_key(|bot| (bot.name() != PRIMARY_BOT, bot.name().to_string()));

        for bot in bots {
            let primary = bot.name() == PRIMARY_BOT;
            match bot.start(self.shutdown.child_token()).await {
                Ok(()) => info!(bot = %bot.name(), "Bot started"),
                Err(ClientError::Disabled { .. }) if !primary => {
                    info!(bot = %bot.name(), "Bot disabled, skipping");
                }
                Err(e) if primary => {
                    error!(bot = %bot.name(), error = %e, "Primary bot failed to start");
                    bot.set_status(BotStatus::Failed);
                    self.running.store(false, Ordering::SeqCst);
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(bot = %bot.name(), error = %e, "Bot failed to start, skipping");
                    bot.set_status(BotStatus::Failed);
                }
            }
        }

        info!(stats = %self.registry.stats(), "Runtime started");
        Ok(())
    }

    /// Cancels every pump and job, then unloads every module.
    pub async fn stop(&self) -> RuntimeResult<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Runtime is not running");
            return Ok(());
        }

        info!("Stopping Cordage runtime");
        self.shutdown.cancel();

        let bots = self.registry.values();
        join_all(bots.iter().map(|bot| bot.stop())).await;

        info!("Runtime stopped");
        Ok(())
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("Cordage runtime is now running. Press Ctrl+C to stop.");
        wait_for_shutdown().await;

        self.stop().await
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl Default for CordageRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`CordageRuntime`] with custom configuration.
///
/// ```rust,ignore
/// let runtime = CordageRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables `CORDAGE_*` environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration on top of every other source.
    pub fn merge(mut self, config: CordageConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> ConfigResult<CordageRuntime> {
        let config = self.config_loader.load()?;
        Ok(CordageRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use cordage_core::{
        ApiResult, CommandApi, CommandData, CommandSpec, Inbound, Interaction, InteractionData,
        Snowflake, User,
    };
    use cordage_framework::options::{ModuleOptions, SlashCommandOptions};
    use cordage_framework::{Module, ModuleClass};
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use crate::config::BotConfig;

    #[derive(Default)]
    struct RecordingApi {
        published: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl CommandApi for RecordingApi {
        async fn replace_global_commands(
            &self,
            commands: Vec<CommandSpec>,
        ) -> ApiResult<Vec<CommandSpec>> {
            let names = commands.iter().map(|c| c.name.clone()).collect();
            self.published.lock().push(names);
            Ok(commands)
        }

        async fn replace_guild_commands(
            &self,
            _guild_id: Snowflake,
            commands: Vec<CommandSpec>,
        ) -> ApiResult<Vec<CommandSpec>> {
            Ok(commands)
        }

        async fn get_global_commands(&self) -> ApiResult<Vec<CommandSpec>> {
            Ok(Vec::new())
        }

        async fn get_guild_commands(&self, _guild_id: Snowflake) -> ApiResult<Vec<CommandSpec>> {
            Ok(Vec::new())
        }
    }

    /// Replays `queued` on login and keeps the feed open.
    struct ScriptedGateway {
        api: Arc<RecordingApi>,
        queued: Mutex<Vec<Inbound>>,
        feed: Mutex<Option<mpsc::Sender<Inbound>>>,
        logins: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(queued: Vec<Inbound>) -> Arc<Self> {
            Arc::new(Self {
                api: Arc::new(RecordingApi::default()),
                queued: Mutex::new(queued),
                feed: Mutex::new(None),
                logins: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Gateway for ScriptedGateway {
        fn command_api(&self) -> Arc<dyn CommandApi> {
            self.api.clone()
        }

        async fn login(&self, _token: &str) -> ApiResult<mpsc::Receiver<Inbound>> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel(16);
            for inbound in self.queued.lock().drain(..) {
                let _ = tx.try_send(inbound);
            }
            *self.feed.lock() = Some(tx);
            Ok(rx)
        }
    }

    struct Pinger {
        hits: Arc<AtomicUsize>,
    }

    impl Module for Pinger {}

    fn pinger(hits: Arc<AtomicUsize>) -> ModuleClass<Pinger> {
        ModuleClass::new(ModuleOptions::new("pinger"), move || {
            Ok(Pinger { hits: hits.clone() })
        })
        .slash_command(
            "ping",
            SlashCommandOptions::new(CommandSpec::new("ping", "Pong")),
            |this: Arc<Pinger>, _| async move {
                this.hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
    }

    fn ping() -> Inbound {
        Inbound::Interaction(Interaction::new(
            1u64,
            User::new(7u64, "user"),
            InteractionData::Command(CommandData::new("ping")),
        ))
    }

    fn bot(token: Option<&str>) -> BotConfig {
        let mut bot = BotConfig {
            token: token.map(str::to_string),
            ..Default::default()
        };
        bot.collector.auto = false;
        bot
    }

    fn runtime(primary: BotConfig, secondary: Option<BotConfig>) -> CordageRuntime {
        let mut config = CordageConfig::default();
        config.bot = primary;
        if let Some(secondary) = secondary {
            config.bots.insert("helper".to_string(), secondary);
        }
        CordageRuntime::from_config(&config)
    }

    #[tokio::test]
    async fn test_run_until_pumps_gateway_into_client() {
        let runtime = runtime(bot(Some("token")), None);
        let gateway = ScriptedGateway::new(vec![ping()]);
        let hits = Arc::new(AtomicUsize::new(0));

        let client = runtime
            .register_bot_with("main", gateway.clone(), Sources::new().module(pinger(hits.clone())))
            .unwrap();

        let observed = hits.clone();
        runtime
            .run_until(async move {
                for _ in 0..200 {
                    if observed.load(Ordering::SeqCst) > 0 {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.logins.load(Ordering::SeqCst), 1);
        assert_eq!(*gateway.api.published.lock(), [vec!["ping".to_string()]]);
        assert!(client.registries().modules.contains("pinger"));
        assert!(!runtime.is_running());
        assert_eq!(runtime.registry().get("MAIN").unwrap().status(), BotStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_missing_primary_token_is_fatal() {
        let runtime = runtime(bot(None), None);
        runtime.register_bot("main", ScriptedGateway::new(vec![])).unwrap();

        let result = runtime.start().await;

        assert!(matches!(
            result,
            Err(RuntimeError::Client(ClientError::MissingToken { bot })) if bot == "main"
        ));
        assert!(!runtime.is_running());
        assert_eq!(runtime.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_secondary_without_token_is_skipped() {
        let runtime = runtime(bot(Some("token")), Some(bot(None)));
        let helper = ScriptedGateway::new(vec![]);
        runtime.register_bot("main", ScriptedGateway::new(vec![])).unwrap();
        runtime.register_bot("Helper", helper.clone()).unwrap();

        runtime.start().await.unwrap();
        let stats = runtime.stats();
        runtime.stop().await.unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.connected, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(helper.logins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_secondary_is_not_started() {
        let mut disabled = bot(Some("token"));
        disabled.enabled = false;
        let runtime = runtime(bot(Some("token")), Some(disabled));
        let helper = ScriptedGateway::new(vec![]);
        runtime.register_bot("main", ScriptedGateway::new(vec![])).unwrap();
        runtime.register_bot("helper", helper.clone()).unwrap();

        runtime.start().await.unwrap();
        runtime.stop().await.unwrap();

        assert_eq!(helper.logins.load(Ordering::SeqCst), 0);
        assert_eq!(runtime.registry().get("helper").unwrap().status(), BotStatus::Registered);
    }

    #[test]
    fn test_register_unknown_or_duplicate_bot() {
        let runtime = runtime(bot(Some("token")), None);

        assert!(matches!(
            runtime.register_bot("other", ScriptedGateway::new(vec![])),
            Err(RuntimeError::BotNotFound(name)) if name == "other"
        ));

        runtime.register_bot("main", ScriptedGateway::new(vec![])).unwrap();
        assert!(matches!(
            runtime.register_bot("Main", ScriptedGateway::new(vec![])),
            Err(RuntimeError::BotExists(_))
        ));
        assert_eq!(runtime.registry().names(), ["main"]);
    }
}
