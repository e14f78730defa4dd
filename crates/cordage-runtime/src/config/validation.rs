//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, CordageConfig, LogOutput, LoggingConfig, PRIMARY_BOT};

/// Validates the entire configuration.
pub fn validate_config(config: &CordageConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_bot_config(PRIMARY_BOT, &config.bot)?;
    validate_bots_config(config)?;
    Ok(())
}

/// Validates logging settings. The level itself is checked when parsed.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if let Some(target) = logging.filters.keys().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Log filter target cannot be empty: '{target}'"
        )));
    }

    if logging.output == LogOutput::File && logging.max_files == 0 {
        return Err(ConfigError::validation(
            "max_files must be greater than 0 for file output",
        ));
    }

    Ok(())
}

/// Validates the named bots, including uniqueness after lowercasing.
fn validate_bots_config(config: &CordageConfig) -> ConfigResult<()> {
    let mut seen = HashSet::from([PRIMARY_BOT.to_string()]);

    for (name, bot) in &config.bots {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidBotName(name.clone()));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ConfigError::DuplicateBotName(name.to_lowercase()));
        }
        validate_bot_config(name, bot)?;
    }

    Ok(())
}

/// Validates a single bot configuration.
fn validate_bot_config(name: &str, bot: &BotConfig) -> ConfigResult<()> {
    if let Some(prefix) = &bot.prefix
        && (prefix.is_empty() || prefix.chars().any(char::is_whitespace))
    {
        return Err(ConfigError::validation(format!(
            "Prefix of bot '{name}' must be non-empty and contain no whitespace"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_bot(name: &str, bot: BotConfig) -> CordageConfig {
        let mut config = CordageConfig::default();
        config.bots.insert(name.to_string(), bot);
        config
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&CordageConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_bot_names() {
        let config = with_bot("my bot", BotConfig::default());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidBotName(_))
        ));

        let mut config = with_bot("Helper", BotConfig::default());
        config.bots.insert("helper".to_string(), BotConfig::default());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicateBotName(name)) if name == "helper"
        ));

        let config = with_bot("MAIN", BotConfig::default());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicateBotName(_))
        ));
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = CordageConfig::default();
        config.bot.prefix = Some("! ".to_string());
        assert!(validate_config(&config).is_err());

        config.bot.prefix = Some(String::new());
        assert!(validate_config(&config).is_err());

        config.bot.prefix = Some("!".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output() {
        let mut config = CordageConfig::default();
        config.logging.output = LogOutput::File;
        config.logging.max_files = 0;
        assert!(validate_config(&config).is_err());
    }
}
