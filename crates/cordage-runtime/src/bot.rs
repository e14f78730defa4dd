//! A bot managed by the runtime.
//!
//! A [`ManagedBot`] pairs one framework [`Client`] with the [`Gateway`] that
//! feeds it. Starting it collects handlers, logs in, publishes commands and
//! spawns a pump task forwarding gateway items to the client.

use std::fmt;
use std::sync::Arc;

use cordage_core::{ClientError, ClientResult, Gateway, Inbound};
use cordage_framework::{Client, CollectSource, Sources};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::config::BotConfig;

/// Current status of a managed bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    /// Registered but not started.
    Registered,
    /// Logged in and pumping events.
    Connected,
    /// Stopped, or the gateway feed ended.
    Disconnected,
    /// Skipped or failed during start.
    Failed,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "Registered"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

pub struct ManagedBot {
    name: String,
    config: BotConfig,
    client: Arc<Client>,
    gateway: Arc<dyn Gateway>,
    status: Arc<RwLock<BotStatus>>,
    /// Explicit sources, consumed by the first start.
    sources: Mutex<Option<Sources>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl ManagedBot {
    pub fn new(
        name: impl Into<String>,
        config: BotConfig,
        gateway: Arc<dyn Gateway>,
        sources: Option<Sources>,
    ) -> Self {
        let name = name.into();
        let client = Arc::new(Client::new(config.client_options(&name), gateway.command_api()));
        Self {
            name,
            config,
            client,
            gateway,
            status: Arc::new(RwLock::new(BotStatus::Registered)),
            sources: Mutex::new(sources),
            pump: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn status(&self) -> BotStatus {
        *self.status.read()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == BotStatus::Connected
    }

    pub(crate) fn set_status(&self, status: BotStatus) {
        let old_status = std::mem::replace(&mut *self.status.write(), status);
        debug!(
            bot = %self.name,
            old_status = %old_status,
            new_status = %status,
            "Bot status changed"
        );
    }

    /// Collects, logs in, synchronizes commands and starts pumping events
    /// until `shutdown` is cancelled.
    pub async fn start(&self, shutdown: CancellationToken) -> ClientResult<()> {
        if !self.config.enabled {
            return Err(ClientError::Disabled {
                bot: self.name.clone(),
            });
        }
        let Some(token) = self.config.token() else {
            return Err(ClientError::MissingToken {
                bot: self.name.clone(),
            });
        };

        let explicit = self.sources.lock().take();
        let source = match explicit {
            Some(sources) => Some(CollectSource::Explicit(sources)),
            None if self.config.collector.auto => Some(CollectSource::Auto),
            None => None,
        };
        match source {
            Some(source) => {
                let report = self.client.collect(source).await;
                if !report.is_clean() {
                    warn!(bot = %self.name, %report, "Some modules failed to load");
                }
            }
            None => warn!(bot = %self.name, "Automatic collection is off and no sources were given"),
        }

        let feed = self.gateway.login(token).await?;
        info!(bot = %self.name, "Logged in");

        let report = self.client.synchronize_commands().await;
        if !report.is_success() {
            warn!(bot = %self.name, %report, "Command synchronization incomplete");
        }

        let pump = tokio::spawn(
            pump(self.client.clone(), feed, shutdown, self.status.clone())
                .instrument(debug_span!("pump", bot = %self.name)),
        );
        *self.pump.lock() = Some(pump);
        self.set_status(BotStatus::Connected);
        Ok(())
    }

    /// Waits for the pump to finish, then shuts the client down.
    ///
    /// The pump only stops once its shutdown token is cancelled or the feed
    /// closes.
    pub async fn stop(&self) {
        let pump = self.pump.lock().take();
        if let Some(pump) = pump
            && let Err(e) = pump.await
        {
            warn!(bot = %self.name, error = %e, "Pump task ended abnormally");
        }
        self.client.shutdown().await;
        if self.status() == BotStatus::Connected {
            self.set_status(BotStatus::Disconnected);
        }
        info!(bot = %self.name, "Bot stopped");
    }
}

async fn pump(
    client: Arc<Client>,
    mut feed: mpsc::Receiver<Inbound>,
    shutdown: CancellationToken,
    status: Arc<RwLock<BotStatus>>,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Pump cancelled");
                break;
            }
            item = feed.recv() => match item {
                Some(inbound) => client.dispatch(inbound),
                None => {
                    info!("Gateway feed closed");
                    *status.write() = BotStatus::Disconnected;
                    break;
                }
            },
        }
    }
}

impl fmt::Debug for ManagedBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedBot")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
