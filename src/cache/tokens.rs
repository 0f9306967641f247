//! Style-class token extraction from script and markup source

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Set of style-class tokens referenced by one source file
pub type TokenSet = BTreeSet<String>;

/// Matches `class=`, `className=` and `class:list=` attribute values.
///
/// The value may be quoted with `"`, `'` or a backtick, optionally inside
/// a JSX expression (`className={"a b"}`). Values may span lines.
fn class_attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?s)\bclass(?:Name|:list)?\s*=\s*\{?\s*(?:"([^"]*)"|'([^']*)'|`([^`]*)`)"#,
        )
        .expect("class attribute pattern is a valid regex")
    })
}

/// Collect every whitespace-separated token inside matched class attributes.
///
/// Tokens are not normalized beyond dropping empty ones.
pub fn extract_tokens(source: &str) -> TokenSet {
    class_attribute_pattern()
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .flat_map(|value| value.as_str().split_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
