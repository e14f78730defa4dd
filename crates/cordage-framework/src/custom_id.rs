//! Arguments embedded in component custom ids.
//!
//! A custom id is a leading key followed by `_`-separated arguments. An
//! argument that itself contains `_` is wrapped in parentheses:
//!
//! ```text
//! ban_175928847299117063_(spam_bot)_7
//! └┬┘ └───────┬────────┘ └───┬────┘ ┬
//!  key       arg 0         arg 1   arg 2
//! ```

use std::sync::LazyLock;

use regex::Regex;

static ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(?:\(([^)]*)\)([^_]*)|([^_]*))").expect("custom id argument pattern is valid")
});

/// The custom id up to, not including, the first `_`.
pub fn leading_key(custom_id: &str) -> &str {
    custom_id
        .split_once('_')
        .map_or(custom_id, |(key, _)| key)
}

/// Splits a custom id into its leading key and argument list.
///
/// Text between a closing parenthesis and the next `_` stays part of the
/// argument, so `a_(b)c_d` yields `["bc", "d"]`.
pub fn parse(custom_id: &str) -> (&str, Vec<String>) {
    let key = leading_key(custom_id);
    let rest = &custom_id[key.len()..];
    let args = ARGUMENT
        .captures_iter(rest)
        .filter_map(|caps| match (caps.get(1), caps.get(3)) {
            (Some(wrapped), _) => {
                let trailing = caps.get(2).map_or("", |m| m.as_str());
                Some(format!("{}{trailing}", wrapped.as_str()))
            }
            (None, plain) => plain.map(|m| m.as_str().to_string()),
        })
        .collect();
    (key, args)
}

/// Builds a custom id that [`parse`] splits back into `key` and `args`.
pub fn compose<I, S>(key: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut id = key.to_string();
    for arg in args {
        let arg = arg.as_ref();
        id.push('_');
        if arg.contains('_') {
            id.push('(');
            id.push_str(arg);
            id.push(')');
        } else {
            id.push_str(arg);
        }
    }
    id
}
