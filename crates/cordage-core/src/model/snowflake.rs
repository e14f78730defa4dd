//! Snowflake identifiers, mention parsing and timestamp tags.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Platform epoch (2015-01-01T00:00:00Z) in milliseconds.
const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

static USER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@!?(\d{17,19})>$").expect("user mention pattern is valid"));
static ROLE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@&(\d{17,19})>$").expect("role mention pattern is valid"));
static CHANNEL_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<#(\d{17,19})>$").expect("channel mention pattern is valid"));
static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{17,19})$").expect("bare id pattern is valid"));

/// A 64-bit platform identifier.
///
/// Serialized as a decimal string, deserialized from either a string or a
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Wraps a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Creation time encoded in the id.
    pub fn timestamp(self) -> DateTime<Utc> {
        let ms = (self.0 >> 22) + PLATFORM_EPOCH_MS;
        Utc.timestamp_millis_opt(ms as i64)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned when a string is not a valid snowflake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid snowflake: '{0}'")]
pub struct ParseSnowflakeError(pub String);

impl FromStr for Snowflake {
    type Err = ParseSnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ParseSnowflakeError(s.to_string()))
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom("snowflake cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

// ─── Mentions ────────────────────────────────────────────────────────────────

fn parse_with(pattern: &Regex, input: &str) -> Option<Snowflake> {
    pattern
        .captures(input)
        .or_else(|| BARE_ID.captures(input))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses `<@id>` / `<@!id>`, or a bare id.
pub fn parse_user_mention(input: &str) -> Option<Snowflake> {
    parse_with(&USER_MENTION, input)
}

/// Parses `<@&id>`, or a bare id.
pub fn parse_role_mention(input: &str) -> Option<Snowflake> {
    parse_with(&ROLE_MENTION, input)
}

/// Parses `<#id>`, or a bare id.
pub fn parse_channel_mention(input: &str) -> Option<Snowflake> {
    parse_with(&CHANNEL_MENTION, input)
}

// ─── Timestamp tags ──────────────────────────────────────────────────────────

/// Display style of a `<t:...>` timestamp tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampStyle {
    /// `16:20`
    ShortTime,
    /// `16:20:30`
    LongTime,
    /// `20/04/2021`
    ShortDate,
    /// `20 April 2021`
    LongDate,
    /// `20 April 2021 16:20`
    #[default]
    ShortDateTime,
    /// `Tuesday, 20 April 2021 16:20`
    LongDateTime,
    /// `2 months ago`
    Relative,
}

impl TimestampStyle {
    /// Single-letter style code.
    pub const fn code(self) -> char {
        match self {
            Self::ShortTime => 't',
            Self::LongTime => 'T',
            Self::ShortDate => 'd',
            Self::LongDate => 'D',
            Self::ShortDateTime => 'f',
            Self::LongDateTime => 'F',
            Self::Relative => 'R',
        }
    }
}

/// Renders a timestamp tag such as `<t:1618932000:R>`.
pub fn timestamp_tag(unix_secs: i64, style: TimestampStyle) -> String {
    format!("<t:{unix_secs}:{}>", style.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: u64 = 175_928_847_299_117_063;

    #[test]
    fn test_mentions_fall_back_to_bare_id() {
        let id = Snowflake::new(ID);
        assert_eq!(parse_user_mention(&format!("<@{ID}>")), Some(id));
        assert_eq!(parse_user_mention(&format!("<@!{ID}>")), Some(id));
        assert_eq!(parse_role_mention(&format!("<@&{ID}>")), Some(id));
        assert_eq!(parse_channel_mention(&format!("<#{ID}>")), Some(id));
        assert_eq!(parse_channel_mention(&ID.to_string()), Some(id));
    }

    #[test]
    fn test_mentions_reject_wrong_form() {
        assert_eq!(parse_role_mention(&format!("<@{ID}>")), None);
        assert_eq!(parse_user_mention("<@123>"), None);
        assert_eq!(parse_user_mention("hello"), None);
    }

    #[test]
    fn test_serde_accepts_string_and_number() {
        let from_str: Snowflake = serde_json::from_str(&format!("\"{ID}\"")).unwrap();
        let from_num: Snowflake = serde_json::from_str(&ID.to_string()).unwrap();
        assert_eq!(from_str, from_num);
        assert_eq!(
            serde_json::to_string(&from_str).unwrap(),
            format!("\"{ID}\"")
        );
    }

    #[test]
    fn test_timestamp_tag() {
        assert_eq!(
            timestamp_tag(1_618_932_000, TimestampStyle::Relative),
            "<t:1618932000:R>"
        );
        assert_eq!(timestamp_tag(0, TimestampStyle::default()), "<t:0:f>");
    }

    #[test]
    fn test_snowflake_timestamp() {
        // 175928847299117063 was created at 2016-04-30T11:18:25.796Z.
        let ts = Snowflake::new(ID).timestamp();
        assert_eq!(ts.timestamp_millis(), 1_462_015_105_796);
    }
}
