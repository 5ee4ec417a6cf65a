use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::clean_text;

static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("valid regex"));

/// Extracts parenthesized category tags from the primary-subject text and the full
/// subjects text of a listing entry.
///
/// The primary field alone misses cross-listed categories, so both sources are merged
/// before extraction. Tags are deduplicated in first-seen order.
pub fn extract_categories(primary_subject: &str, full_subjects: &str) -> Vec<String> {
    let merged = [clean_text(primary_subject), clean_text(full_subjects)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut seen = HashSet::new();
    PAREN_RE
        .captures_iter(&merged)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_string()))
        .map(str::to_string)
        .collect()
}

/// Parses a comma-separated category list. Entries are trimmed, empty ones dropped and
/// duplicates collapsed in first-seen order.
pub fn parse_category_list(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}

/// A paper without parsed categories is kept; otherwise at least one tag must be targeted.
pub fn matches_targets(categories: &[String], targets: &HashSet<String>) -> bool {
    categories.is_empty() || categories.iter().any(|tag| targets.contains(tag))
}
