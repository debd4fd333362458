//! `[[tag]]` mention extraction from note, todo and comment content.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a tag name, in characters.
pub const MAX_TAG_LEN: usize = 100;

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]\r\n]+)\]\]").expect("valid mention pattern"));
static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid fenced code pattern"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`\n]+`").expect("valid inline code pattern"));

/// Extract tag names mentioned as `[[name]]`.
///
/// # Rules
///
/// 1. Names are trimmed; empty names are skipped
/// 2. Names may not contain `[`, `]` or line breaks
/// 3. Names longer than [`MAX_TAG_LEN`] characters are skipped
/// 4. Mentions inside fenced or inline code are ignored
/// 5. Duplicates are removed case-insensitively; the first spelling wins
///
/// Order of first appearance is preserved.
///
/// ```
/// use jotter_core::extract_mentions;
///
/// let tags = extract_mentions("Call [[Work]] about [[travel]] and [[work]]");
/// assert_eq!(tags, vec!["Work".to_string(), "travel".to_string()]);
/// ```
pub fn extract_mentions(content: &str) -> Vec<String> {
    let without_fences = FENCED_CODE.replace_all(content, "");
    let cleaned = INLINE_CODE.replace_all(&without_fences, "");

    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for cap in MENTION.captures_iter(&cleaned) {
        let Some(m) = cap.get(1) else { continue };
        let name = m.as_str().trim();
        if name.is_empty() || name.chars().count() > MAX_TAG_LEN {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            tags.push(name.to_string());
        }
    }
    tags
}

/// Validate a tag name for direct creation or rename.
pub fn validate_tag_name(name: &str) -> std::result::Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_TAG_LEN {
        return Err(format!("Tag name must be {} characters or less", MAX_TAG_LEN));
    }
    if trimmed.contains(['[', ']', '\n', '\r']) {
        return Err("Tag name cannot contain brackets or line breaks".to_string());
    }
    Ok(())
}
