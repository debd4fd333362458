//! URL slugs for folders and generic notes.

use std::collections::HashSet;

/// Maximum slug length in bytes (slugs are ASCII).
pub const MAX_SLUG_LEN: usize = 80;

/// Derive a slug from a display name.
///
/// Lowercases ASCII alphanumerics, collapses every other run of characters
/// into a single `-`, and trims dashes. Names with no usable characters
/// become `"untitled"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Pick `base`, or `base-2`, `base-3`, ... whichever is not in `taken`.
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
