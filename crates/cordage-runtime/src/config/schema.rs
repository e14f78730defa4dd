//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use cordage_core::Snowflake;
use cordage_framework::{ClientOptions, SyncScopes};
use serde::{Deserialize, Serialize};

/// Name under which the primary bot is registered.
pub const PRIMARY_BOT: &str = "main";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CordageConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The primary bot.
    #[serde(default)]
    pub bot: BotConfig,

    /// Additional bots by name.
    #[serde(default)]
    pub bots: BTreeMap<String, BotConfig>,
}

impl CordageConfig {
    /// Looks a bot up by name, ignoring case. [`PRIMARY_BOT`] names the
    /// primary bot.
    pub fn bot_config(&self, name: &str) -> Option<&BotConfig> {
        if name.eq_ignore_ascii_case(PRIMARY_BOT) {
            return Some(&self.bot);
        }
        self.bots
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, config)| config)
    }

    /// Every configured bot name, primary first.
    pub fn bot_names(&self) -> Vec<String> {
        std::iter::once(PRIMARY_BOT.to_string())
            .chain(self.bots.keys().map(|name| name.to_lowercase()))
            .collect()
    }
}

// =============================================================================
// Bots
// =============================================================================

/// Settings of one bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Login token.
    #[serde(default)]
    pub token: Option<String>,

    /// Whether this bot is started.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Text command prefix.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Users allowed through developer-only handlers.
    #[serde(default)]
    pub developers: Vec<Snowflake>,

    #[serde(default)]
    pub synchronize: SyncConfig,

    #[serde(default)]
    pub application_name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub collector: CollectorConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            enabled: true,
            prefix: None,
            developers: Vec::new(),
            synchronize: SyncConfig::default(),
            application_name: None,
            version: None,
            collector: CollectorConfig::default(),
        }
    }
}

impl BotConfig {
    /// The token, if set and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.trim().is_empty())
    }

    /// Builds the client options for a bot called `name`.
    pub fn client_options(&self, name: &str) -> ClientOptions {
        let mut options = ClientOptions::new(name)
            .developers(self.developers.iter().copied())
            .sync(self.synchronize.into());
        options.prefix.clone_from(&self.prefix);
        options.application_name.clone_from(&self.application_name);
        options.version.clone_from(&self.version);
        options
    }
}

fn default_true() -> bool {
    true
}

/// Which command scopes are synchronized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub global: bool,
    #[serde(default = "default_true")]
    pub guild: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            global: true,
            guild: true,
        }
    }
}

impl From<SyncConfig> for SyncScopes {
    fn from(config: SyncConfig) -> Self {
        Self {
            global: config.global,
            guild: config.guild,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Collect every `#[register_module]` / `#[register_view]` factory when
    /// no explicit sources are given.
    #[serde(default = "default_true")]
    pub auto: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { auto: true }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of the call site.
    #[serde(default)]
    pub file_location: bool,

    /// Log file, required for [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Rotated files kept on disk.
    #[serde(default = "default_max_files")]
    pub max_files: u32,

    /// Per-target levels, e.g. `cordage_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::default(),
            max_files: default_max_files(),
            filters: BTreeMap::new(),
        }
    }
}

fn default_max_files() -> u32 {
    5
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `Full` without it.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_lookup_ignores_case() {
        let mut config = CordageConfig::default();
        config.bots.insert(
            "Helper".to_string(),
            BotConfig {
                prefix: Some("?".to_string()),
                ..Default::default()
            },
        );

        assert!(config.bot_config("MAIN").is_some());
        assert_eq!(config.bot_config("helper").and_then(|b| b.prefix.as_deref()), Some("?"));
        assert!(config.bot_config("other").is_none());
        assert_eq!(config.bot_names(), ["main", "helper"]);
    }

    #[test]
    fn test_client_options_from_bot_config() {
        let bot = BotConfig {
            prefix: Some("!".to_string()),
            developers: vec![Snowflake::new(42)],
            synchronize: SyncConfig {
                global: false,
                guild: true,
            },
            ..Default::default()
        };
        let options = bot.client_options("main");

        assert_eq!(options.name, "main");
        assert_eq!(options.prefix.as_deref(), Some("!"));
        assert!(options.developers.contains(&Snowflake::new(42)));
        assert!(!options.sync.global && options.sync.guild);
    }

    #[test]
    fn test_blank_token_is_missing() {
        let bot = BotConfig {
            token: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(bot.token(), None);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
