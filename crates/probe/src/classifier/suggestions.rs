//! "Did you mean ..." parsing.

use crate::wordlist::is_valid_name;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static DID_YOU_MEAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)did you mean").expect("valid pattern"));

// A quoted name, optionally followed by a selection hint as in `"user { ... }"`.
#[allow(clippy::expect_used)]
static QUOTED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["'`](?P<name>[_A-Za-z]\w*)(?:\s*\{[^}]*\})?["'`]"#).expect("valid pattern")
});

/// Extracts suggested field names from "Did you mean ..." phrasing.
///
/// Quoted names are preferred; if none are quoted, comma and `or` separated
/// bare identifiers are used. Inline-fragment suggestions name types, not
/// fields, and yield nothing. Order is preserved and repeats are dropped.
///
/// ```
/// use blindql_probe::classifier::extract_suggestions;
///
/// let message = r#"Cannot query field "usr" on type "Query". Did you mean "user" or "users"?"#;
/// assert_eq!(extract_suggestions(message), ["user", "users"]);
/// ```
#[must_use]
pub fn extract_suggestions(message: &str) -> Vec<String> {
    let Some(found) = DID_YOU_MEAN.find(message) else {
        return Vec::new();
    };

    let tail = message[found.end()..]
        .split('?')
        .next()
        .unwrap_or_default()
        .trim_start();
    if tail.to_ascii_lowercase().starts_with("to use an inline fragment") {
        return Vec::new();
    }

    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    let mut quoted = false;
    for caps in QUOTED_NAME.captures_iter(tail) {
        if let Some(name) = caps.name("name") {
            quoted = true;
            push(name.as_str());
        }
    }

    if !quoted {
        for token in tail.split(',').flat_map(|part| part.split(" or ")) {
            let token = token.trim().trim_end_matches(['.', '!', ')']);
            let token = token.strip_prefix("or ").unwrap_or(token).trim();
            if is_valid_name(token) && token != "or" {
                push(token);
            }
        }
    }

    names
}
