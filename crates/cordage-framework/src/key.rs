//! Composite registry keys.
//!
//! The same functions run at registration and at lookup, so both sides always
//! agree. Segments are joined with `_` only.

use crate::custom_id;

/// Separator between key segments.
pub const SEPARATOR: char = '_';

/// Key of a top-level slash command.
pub fn slash_command(name: &str) -> String {
    name.to_lowercase()
}

/// Key of a text command.
pub fn text_command(name: &str) -> String {
    name.to_lowercase()
}

/// Key of a subcommand or autocomplete provider: `parent[_group][_name]`.
pub fn composite(parent: &str, group: Option<&str>, name: Option<&str>) -> String {
    let mut key = parent.to_lowercase();
    for segment in [group, name].into_iter().flatten() {
        if segment.is_empty() {
            continue;
        }
        key.push(SEPARATOR);
        key.push_str(&segment.to_lowercase());
    }
    key
}

/// Key of an event listener: `module_event`.
pub fn event(module: &str, event: &str) -> String {
    format!("{module}{SEPARATOR}{event}")
}

/// Key of a component or view entry: the custom id's leading segment.
pub fn component(custom_id: &str) -> &str {
    custom_id::leading_key(custom_id)
}

/// `key` followed by each shorter `_`-prefix of it, most specific first.
///
/// `"p_g_n"` yields `"p_g_n"`, `"p_g"`, `"p"`.
pub fn prefixes(key: &str) -> impl Iterator<Item = &str> {
    let cuts = key
        .char_indices()
        .filter(|&(_, c)| c == SEPARATOR)
        .map(|(i, _)| i)
        .rev();
    std::iter::once(key).chain(cuts.map(move |i| &key[..i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_key_is_lowercase() {
        assert_eq!(slash_command("Ping"), "ping");
        assert_eq!(slash_command("PING"), slash_command("ping"));
    }

    #[test]
    fn test_composite_key() {
        assert_eq!(composite("p", Some("g"), Some("n")), "p_g_n");
        assert_eq!(composite("p", None, Some("n")), "p_n");
        assert_eq!(composite("p", Some("g"), None), "p_g");
        assert_eq!(composite("p", None, None), "p");
        assert_ne!(
            composite("p", Some("g"), Some("n")),
            composite("p", None, Some("n"))
        );
    }

    #[test]
    fn test_composite_ignores_empty_segments() {
        assert_eq!(composite("p", Some(""), Some("n")), "p_n");
    }

    #[test]
    fn test_event_key() {
        assert_eq!(event("greeter", "ready"), "greeter_ready");
    }

    #[test]
    fn test_prefixes_most_specific_first() {
        let all: Vec<_> = prefixes("p_g_n").collect();
        assert_eq!(all, ["p_g_n", "p_g", "p"]);
        assert_eq!(prefixes("p").collect::<Vec<_>>(), ["p"]);
    }
}
