use std::collections::HashSet;

/// Split a deck name into its primary part and optional parenthesised group
/// "A/B (C/D)" -> ("A/B", Some("C/D"))
fn split_group(value: &str) -> (&str, Option<&str>) {
    match value.split_once('(') {
        Some((primary, rest)) => {
            let group = rest.trim();
            let group = group.strip_suffix(')').unwrap_or(group);
            (primary.trim(), Some(group.trim()))
        }
        None => (value.trim(), None),
    }
}

/// Split on slashes and trim each token
fn slash_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split('/').map(str::trim).filter(|t| !t.is_empty())
}

/// Sort the slash-separated tokens of a value
fn sort_slashed(value: &str) -> String {
    let mut tokens: Vec<&str> = slash_tokens(value).collect();
    tokens.sort_unstable();
    tokens.join("/")
}

/// Canonicalize a deck name so different spellings of the same deck compare equal.
///
/// Tokens of the primary part and of the parenthesised group are trimmed and sorted:
/// `" B / A ( D / C ) "` becomes `"A/B (C/D)"`. Sanitizing is idempotent.
pub fn sanitize(value: &str) -> String {
    match split_group(value) {
        (primary, Some(group)) => format!("{} ({})", sort_slashed(primary), sort_slashed(group)),
        (primary, None) => sort_slashed(primary),
    }
}

/// Check that no component is repeated across the given deck names.
///
/// Every slash-separated token of a primary part counts as one component, and each
/// parenthesised group counts as a single component as a whole.
pub fn all_components_unique<'a, I>(names: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        let (primary, group) = split_group(name);
        for token in slash_tokens(primary) {
            if !seen.insert(token.to_string()) {
                return false;
            }
        }
        if let Some(group) = group {
            // Groups live in their own namespace so "X (A)" and "A" stay distinct
            if !seen.insert(format!("({})", sort_slashed(group))) {
                return false;
            }
        }
    }
    true
}
