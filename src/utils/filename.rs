// src/utils/filename.rs

use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename regex")
});

/// Reduces a client-supplied file name to a safe basename.
///
/// Path components are dropped, whitespace and other unsafe characters become
/// `_`, and leading dots are removed so the result can never be `..` or a
/// hidden file. Returns `None` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let replaced = UNSAFE_CHARS.replace_all(base.trim(), "_");
    let cleaned = replaced.trim_start_matches(['.', '_']).trim_end_matches('_');

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.chars().take(200).collect())
    }
}
