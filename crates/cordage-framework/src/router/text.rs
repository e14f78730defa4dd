//! Prefix-triggered text commands.
//!
//! A message like `!ban <@175928847299117063> 7 spamming links` is split on
//! whitespace. The first token, minus the prefix and lowercased, names the
//! command. Each declared [`ArgSpec`] then consumes one token, trying its
//! candidate [`ArgKind`]s in order, except [`ArgKind::Text`], which takes the
//! remaining tokens joined by single spaces and ends parsing.

use std::collections::HashSet;
use std::sync::Arc;

use cordage_core::{Message, Snowflake, parse_channel_mention, parse_role_mention, parse_user_mention};
use tracing::{debug, debug_span, trace};

use super::access::{Access, Rejection};
use super::{RouteOutcome, spawn_handler};
use crate::handler::Invocation;
use crate::key;
use crate::options::{ArgKind, ArgSpec};
use crate::registry::Registries;

/// One parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    User(Snowflake),
    Role(Snowflake),
    Channel(Snowflake),
    String(String),
    Number(f64),
    Text(String),
}

impl ArgValue {
    /// The snowflake behind a user, role or channel value.
    pub fn as_id(&self) -> Option<Snowflake> {
        match self {
            Self::User(id) | Self::Role(id) | Self::Channel(id) => Some(*id),
            _ => None,
        }
    }

    /// The text behind a string or text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Positional arguments of a text command. Optional slots with no value are
/// `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextArgs(Vec<Option<ArgValue>>);

impl TextArgs {
    pub fn new(values: Vec<Option<ArgValue>>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.0.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ArgValue>> {
        self.0.iter().map(Option::as_ref)
    }
}

fn extract(kind: ArgKind, token: &str) -> Option<ArgValue> {
    match kind {
        ArgKind::User => parse_user_mention(token).map(ArgValue::User),
        ArgKind::Role => parse_role_mention(token).map(ArgValue::Role),
        ArgKind::Channel => parse_channel_mention(token).map(ArgValue::Channel),
        ArgKind::Number => token.parse::<f64>().ok().filter(|n| n.is_finite()).map(ArgValue::Number),
        ArgKind::String => Some(ArgValue::String(token.to_string())),
        ArgKind::Text => Some(ArgValue::Text(token.to_string())),
    }
}

/// Parses `tokens` against `specs`.
///
/// A required slot without a matching value fails with
/// [`Rejection::MissingArgument`]. An optional slot whose token matches none
/// of its types yields `None` and leaves the token for the next slot.
pub fn parse_args(specs: &[ArgSpec], tokens: &[&str]) -> Result<TextArgs, Rejection> {
    let mut values = Vec::with_capacity(specs.len());
    let mut rest = tokens;

    for (index, spec) in specs.iter().enumerate() {
        let mut value = None;
        for &kind in &spec.types {
            if kind == ArgKind::Text {
                if !rest.is_empty() {
                    value = Some(ArgValue::Text(rest.join(" ")));
                    rest = &[];
                }
                break;
            }
            if let Some(v) = rest.first().and_then(|token| extract(kind, token)) {
                value = Some(v);
                rest = &rest[1..];
                break;
            }
        }

        if value.is_none() && spec.required {
            return Err(Rejection::MissingArgument { index });
        }
        values.push(value);
    }

    Ok(TextArgs(values))
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Routes chat messages to text commands.
pub struct TextRouter<'a> {
    registries: &'a Registries,
    developers: &'a HashSet<Snowflake>,
    prefix: Option<&'a str>,
}

impl<'a> TextRouter<'a> {
    pub fn new(
        registries: &'a Registries,
        developers: &'a HashSet<Snowflake>,
        prefix: Option<&'a str>,
    ) -> Self {
        Self {
            registries,
            developers,
            prefix,
        }
    }

    pub fn route(&self, message: Message) -> RouteOutcome {
        let Some(prefix) = self.prefix.filter(|p| !p.is_empty()) else {
            return RouteOutcome::Ignored;
        };
        let tokens: Vec<&str> = message.content.split_whitespace().collect();
        let Some(name) = tokens.first().and_then(|first| first.strip_prefix(prefix)) else {
            return RouteOutcome::Ignored;
        };

        let key = key::text_command(name);
        let _span = debug_span!("route_text", key = %key).entered();
        let Some(entry) = self.registries.text_commands.get(&key) else {
            trace!("No text command registered");
            return RouteOutcome::NotFound;
        };

        let access = Access {
            registries: self.registries,
            developers: self.developers,
        };
        let checked = access
            .module_enabled(&entry.module)
            .and_then(|()| access.developer(&entry.module, entry.options.dev_only, message.author.id))
            .and_then(|()| parse_args(&entry.options.args, &tokens[1..]));
        let args = match checked {
            Ok(args) => args,
            Err(rejection) => {
                debug!(%rejection, "Text command rejected");
                return RouteOutcome::Rejected(rejection);
            }
        };

        let invocation = Invocation::Text {
            message: Arc::new(message),
            args,
        };
        RouteOutcome::Dispatched(vec![spawn_handler(key, entry.executor.clone(), invocation)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_before_string() {
        let specs = [ArgSpec::required([ArgKind::Number, ArgKind::String])];

        let args = parse_args(&specs, &["42"]).unwrap();
        assert_eq!(args.get(0), Some(&ArgValue::Number(42.0)));

        let args = parse_args(&specs, &["abc"]).unwrap();
        assert_eq!(args.get(0), Some(&ArgValue::String("abc".into())));
    }

    #[test]
    fn test_text_consumes_rest() {
        let specs = [
            ArgSpec::required([ArgKind::User]),
            ArgSpec::optional([ArgKind::Text]),
        ];
        let args = parse_args(&specs, &["<@175928847299117063>", "spamming", "links", "again"]).unwrap();

        assert_eq!(args.get(0).and_then(ArgValue::as_id), Some(Snowflake::new(175928847299117063)));
        assert_eq!(args.get(1), Some(&ArgValue::Text("spamming links again".into())));
    }

    #[test]
    fn test_mentions_and_bare_ids() {
        let specs = [
            ArgSpec::required([ArgKind::Role]),
            ArgSpec::required([ArgKind::Channel]),
        ];
        let args = parse_args(&specs, &["<@&175928847299117063>", "175928847299117064"]).unwrap();

        assert_eq!(args.get(0), Some(&ArgValue::Role(Snowflake::new(175928847299117063))));
        assert_eq!(args.get(1), Some(&ArgValue::Channel(Snowflake::new(175928847299117064))));
    }

    #[test]
    fn test_missing_required_argument() {
        let specs = [
            ArgSpec::required([ArgKind::String]),
            ArgSpec::required([ArgKind::Number]),
        ];
        assert_eq!(
            parse_args(&specs, &["only"]),
            Err(Rejection::MissingArgument { index: 1 })
        );
        assert_eq!(
            parse_args(&specs, &["a", "not-a-number"]),
            Err(Rejection::MissingArgument { index: 1 })
        );
    }

    #[test]
    fn test_missing_optional_argument_is_none() {
        let specs = [
            ArgSpec::required([ArgKind::String]),
            ArgSpec::optional([ArgKind::Number]),
        ];
        let args = parse_args(&specs, &["a"]).unwrap();

        assert_eq!(args.len(), 2);
        assert_eq!(args.get(1), None);
    }

    #[test]
    fn test_optional_slot_leaves_unmatched_token() {
        let specs = [
            ArgSpec::optional([ArgKind::Number]),
            ArgSpec::required([ArgKind::String]),
        ];
        let args = parse_args(&specs, &["word"]).unwrap();

        assert_eq!(args.get(0), None);
        assert_eq!(args.get(1).and_then(ArgValue::as_str), Some("word"));
    }
}
