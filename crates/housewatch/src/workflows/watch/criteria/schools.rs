use std::collections::HashSet;

use super::super::domain::{SchoolTier, SchoolsByTier};

/// Generic school words that never distinguish one school from another.
const STOP_WORDS: [&str; 6] = ["school", "high", "elementary", "middle", "junior", "senior"];

fn word_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Whether an observed school name satisfies a required one.
///
/// Every distinguishing word of `required` must appear as a whole word somewhere in
/// `candidate`, in any order, ignoring case. When `required` consists only of stop words
/// the whole name must appear as a case-insensitive substring instead. A blank required
/// name matches nothing.
pub fn tokens_match(required: &str, candidate: &str) -> bool {
    let required = required.trim();
    if required.is_empty() {
        return false;
    }

    let distinguishing: Vec<String> = word_tokens(required)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect();

    if distinguishing.is_empty() {
        return candidate.to_lowercase().contains(&required.to_lowercase());
    }

    let observed: HashSet<String> = word_tokens(candidate).collect();
    distinguishing.iter().all(|token| observed.contains(token))
}

/// A tier is satisfied when it has no requirement or any required name matches any
/// observed name for that tier.
pub(crate) fn tier_satisfied(required: &[String], observed: &[String]) -> bool {
    required.is_empty()
        || required
            .iter()
            .any(|name| observed.iter().any(|seen| tokens_match(name, seen)))
}

/// First tier, in elementary/middle/high order, whose requirement is unmet.
pub(crate) fn first_unmet_tier(
    required: &SchoolsByTier,
    observed: &SchoolsByTier,
) -> Option<SchoolTier> {
    SchoolTier::ALL
        .into_iter()
        .find(|tier| !tier_satisfied(required.get(*tier), observed.get(*tier)))
}
