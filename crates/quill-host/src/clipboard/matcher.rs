//! Email, URL and phone-number extraction from clipboard text.

use std::sync::LazyLock;

use regex::{Match, Regex};

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").ok());

static URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"]*[^\s<>"'.,;:!?)\]]"#).ok()
});

// A parenthesised form is tried first so "(555 123 4567)" is taken whole.
static PHONE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\(\+?\d[\d\- .()]{5,}\d\)|\+?\d[\d\- .()]{5,}\d").ok()
});

/// Returns the distinct, non-overlapping matches in `text`, in order of
/// appearance.
///
/// A match is skipped when it overlaps or repeats an earlier accepted match,
/// or when it spans the whole text. Matches wrapped in parentheses lose them.
#[must_use]
pub fn extract_matches(text: &str) -> Vec<String> {
    let mut found: Vec<Match<'_>> = [&*EMAIL, &*URL, &*PHONE]
        .into_iter()
        .flatten()
        .flat_map(|pattern| pattern.find_iter(text))
        .collect();
    found.sort_by_key(|hit| (hit.start(), std::cmp::Reverse(hit.len())));

    let mut accepted: Vec<Match<'_>> = Vec::new();
    for candidate in found {
        if candidate.as_str() == text {
            continue;
        }
        let clashes = accepted.iter().any(|previous| {
            previous.as_str() == candidate.as_str()
                || (previous.start() < candidate.end() && candidate.start() < previous.end())
        });
        if !clashes {
            accepted.push(candidate);
        }
    }

    accepted
        .into_iter()
        .map(|found| strip_parentheses(found.as_str()).to_owned())
        .collect()
}

fn strip_parentheses(value: &str) -> &str {
    value
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(value)
}
