use crate::models::Bookmark;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Add,
    Remove(i64),
}

/// What toggling `word` does given the current bookmarks.
pub fn toggle_action(bookmarks: &[Bookmark], word: &str) -> ToggleAction {
    let word = word.trim();
    bookmarks
        .iter()
        .find(|bookmark| bookmark.word_insight.trim().eq_ignore_ascii_case(word))
        .map(|bookmark| ToggleAction::Remove(bookmark.id))
        .unwrap_or(ToggleAction::Add)
}

/// Lowercased words, for marking bookmarked rows while rendering.
pub fn bookmarked_words(bookmarks: &[Bookmark]) -> HashSet<String> {
    bookmarks
        .iter()
        .map(|bookmark| bookmark.word_insight.trim().to_lowercase())
        .collect()
}

/// Only same-site paths may be used as a post-toggle redirect.
pub fn safe_return_path(candidate: Option<&str>, fallback: &'static str) -> String {
    match candidate.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}
