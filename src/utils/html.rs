use std::collections::HashSet;

use ammonia::Builder;

/// Strips every HTML tag from a short user-facing label such as a document title.
///
/// Titles come from file names or free-text input and are echoed back to
/// browsers in listings, so no markup is allowed at all. Text between ordinary
/// tags is kept; `<script>` and `<style>` are removed with their content.
pub fn clean_label(input: &str) -> String {
    Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input)
        .to_string()
        .trim()
        .to_string()
}
