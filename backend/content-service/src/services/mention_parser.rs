//! Mention Parser Utility
//!
//! Extracts @mentions from reply text so tagged users can be resolved.

use regex::Regex;
use std::sync::LazyLock;

/// Regex pattern for matching @mentions
/// Handles may contain letters, digits, underscores and dots
static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w.]+)").expect("Invalid mention regex"));

/// Extract @mentions from content text
///
/// Returns a deduplicated list of handles mentioned (without the @ symbol),
/// lowercased, in order of first appearance. Trailing dots are sentence
/// punctuation, not part of the handle.
///
/// # Examples
/// ```
/// use content_service::services::extract_mentions;
///
/// let content = "Hey @alice and @bob, check this out! @alice again";
/// let mentions = extract_mentions(content);
/// assert_eq!(mentions, vec!["alice", "bob"]);
/// ```
pub fn extract_mentions(content: &str) -> Vec<String> {
    let mentions: Vec<String> = MENTION_REGEX
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_lowercase())
        .filter(|handle| !handle.is_empty())
        .collect();

    // Deduplicate while preserving first occurrence order
    let mut seen = std::collections::HashSet::new();
    mentions
        .into_iter()
        .filter(|handle| seen.insert(handle.clone()))
        .collect()
}
