//! Scoring of bookmarks against the free-text term of a `@` query.

use super::bookmark::Bookmark;
use super::scoring::{
    character_similarity, SCORE_EXACT_HOSTNAME_BONUS, SCORE_EXACT_MATCH, SCORE_FUZZY_MATCH,
    SCORE_POSITION_BONUS, SCORE_PREFIX_MATCH, SCORE_SUBSTRING_MATCH,
};

/// A bookmark paired with its match score.
#[derive(Debug, Clone)]
pub struct BookmarkCandidate<'a> {
    pub bookmark: &'a Bookmark,
    pub score: f64,
}

/// Calculate the match score for a bookmark label against a query term.
pub fn score_bookmark(term: &str, bookmark: &Bookmark) -> f64 {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return 0.0;
    }
    let abbr = bookmark.abbr.to_lowercase();

    if term == abbr {
        return SCORE_EXACT_MATCH + SCORE_EXACT_HOSTNAME_BONUS;
    }

    if abbr.starts_with(&term) {
        return SCORE_PREFIX_MATCH;
    }

    if let Some(index) = abbr.find(&term) {
        let substring_bonus = SCORE_POSITION_BONUS * (1.0 - index as f64 / abbr.len() as f64);
        return SCORE_SUBSTRING_MATCH + substring_bonus;
    }

    // Multi-word terms match when every word appears somewhere in the label.
    let words: Vec<&str> = term.split_whitespace().collect();
    if words.len() > 1 && words.iter().all(|w| abbr.contains(w)) {
        return SCORE_FUZZY_MATCH;
    }

    let similarity = character_similarity(&term, &abbr);
    if similarity > 0.5 {
        return SCORE_FUZZY_MATCH * similarity;
    }

    0.0
}

/// Rank bookmarks for a query term, skipping disabled and zero-score
/// entries. Sorted by descending score; ties keep the input order.
pub fn rank_bookmark_candidates<'a>(
    term: &str,
    bookmarks: &'a [Bookmark],
) -> Vec<BookmarkCandidate<'a>> {
    let mut candidates: Vec<BookmarkCandidate<'a>> = bookmarks
        .iter()
        .filter(|b| !b.disabled)
        .filter_map(|bookmark| {
            let score = score_bookmark(term, bookmark);
            if score == 0.0 {
                return None;
            }
            Some(BookmarkCandidate { bookmark, score })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates
}
