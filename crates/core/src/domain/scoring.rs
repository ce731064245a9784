//! Fuzzy scoring and ranking of services against a parsed query.
//!
//! Scores are built from per-fragment comparisons: exact beats prefix beats
//! substring beats fuzzy, with small bonuses for label position and short
//! hostnames. Usage counters are blended in logarithmically so heavily used
//! services win ties without drowning out lexical relevance.

use super::query::{hostname_fragments, normalize_fragment, Query};
use super::service::Service;

pub const SCORE_EXACT_MATCH: f64 = 100.0;
pub const SCORE_PREFIX_MATCH: f64 = 75.0;
pub const SCORE_SUBSTRING_MATCH: f64 = 50.0;
pub const SCORE_FUZZY_MATCH: f64 = 25.0;

/// Bonus for matches on earlier hostname labels.
pub const SCORE_POSITION_BONUS: f64 = 10.0;

/// Bonus applied to short top-level labels when anything matched.
pub const SCORE_LENGTH_BONUS: f64 = 5.0;

/// Extra boost when a single-fragment query equals the top-level label.
pub const SCORE_EXACT_HOSTNAME_BONUS: f64 = 200.0;

/// Multiplier for the logarithmic usage contribution.
pub const SCORE_USAGE_WEIGHT: f64 = 10.0;

/// A service paired with its scoring result, pending liveness confirmation.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub service: &'a Service,
    pub lexical_score: f64,
    pub usage_score: f64,
    pub total_score: f64,
}

/// Calculate the lexical match score for a service against a query.
///
/// Pure and deterministic: the same inputs always produce the same score.
pub fn score(query: &Query, service: &Service) -> f64 {
    let host_fragments = hostname_fragments(&service.hostname);

    if query.has_dot {
        score_with_subdomains(query, &host_fragments)
    } else {
        score_top_level_only(&query.top_level_fragments, &host_fragments)
    }
}

/// Score when no dot is present: only the first hostname label participates.
fn score_top_level_only(query_fragments: &[String], host_fragments: &[String]) -> f64 {
    let Some(top_level) = host_fragments.first() else {
        return 0.0;
    };
    if query_fragments.is_empty() {
        return 0.0;
    }

    // A single fragment equal to the whole top-level label is the jackpot.
    if query_fragments.len() == 1 && query_fragments[0] == *top_level {
        return SCORE_EXACT_MATCH + SCORE_EXACT_HOSTNAME_BONUS;
    }

    let mut total: f64 = query_fragments
        .iter()
        .map(|frag| score_fragment(frag, top_level, 0))
        .sum();

    if total > 0.0 && top_level.len() < 10 {
        total += SCORE_LENGTH_BONUS;
    }

    total
}

/// Score when a dot is present. Typing `x.y` asks for subdomain matching
/// explicitly: the hostname must have subdomain labels and at least one
/// subdomain fragment must match one of them, otherwise the score is zero.
fn score_with_subdomains(query: &Query, host_fragments: &[String]) -> f64 {
    if query.subdomain_fragments.is_empty() || host_fragments.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;

    if let Some(top_level) = host_fragments.first() {
        for frag in &query.top_level_fragments {
            total += score_fragment(frag, top_level, 0);
        }
    }

    // Each subdomain fragment contributes its best match over the remaining
    // labels, with the position bonus keyed to the matched label's depth.
    let subdomains = &host_fragments[1..];
    let mut subdomain_score = 0.0;
    for frag in &query.subdomain_fragments {
        let best = subdomains
            .iter()
            .enumerate()
            .map(|(i, label)| score_fragment(frag, label, i))
            .fold(0.0, f64::max);
        subdomain_score += best;
    }

    if subdomain_score == 0.0 {
        return 0.0;
    }

    total + subdomain_score
}

/// Score a single query fragment against a hostname label.
fn score_fragment(query_frag: &str, host_frag: &str, position: usize) -> f64 {
    let query_frag = normalize_fragment(query_frag);
    let host_frag = normalize_fragment(host_frag);

    if query_frag.is_empty() || host_frag.is_empty() {
        return 0.0;
    }

    if query_frag == host_frag {
        return SCORE_EXACT_MATCH + position_bonus(position);
    }

    if host_frag.starts_with(&query_frag) {
        return SCORE_PREFIX_MATCH + position_bonus(position);
    }

    if let Some(index) = host_frag.find(&query_frag) {
        // Earlier substring matches score higher.
        let substring_bonus =
            SCORE_POSITION_BONUS * (1.0 - index as f64 / host_frag.len() as f64);
        return SCORE_SUBSTRING_MATCH + substring_bonus;
    }

    let similarity = character_similarity(&query_frag, &host_frag);
    if similarity > 0.5 {
        return SCORE_FUZZY_MATCH * similarity;
    }

    0.0
}

/// Bonus for earlier label positions, decaying exponentially with depth.
fn position_bonus(position: usize) -> f64 {
    SCORE_POSITION_BONUS * (-(position as f64) * 0.3).exp()
}

/// Ratio of characters of `s1` that occur anywhere in `s2`.
pub(crate) fn character_similarity(s1: &str, s2: &str) -> f64 {
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let matches = s1.chars().filter(|c| s2.contains(*c)).count();
    matches as f64 / s1.chars().count() as f64
}

/// Logarithmic usage contribution so popular services cannot dominate on
/// counter alone.
pub(crate) fn usage_score(counter: u64) -> f64 {
    if counter == 0 {
        return 0.0;
    }
    (counter as f64 + 1.0).log10() * SCORE_USAGE_WEIGHT
}

/// Rank services for a query, combining lexical and usage scores.
///
/// Disabled entries and zero-score entries are skipped. The result is
/// sorted by descending total score; ties keep the input order.
pub fn rank_candidates<'a>(query: &Query, services: &'a [Service]) -> Vec<Candidate<'a>> {
    let mut candidates: Vec<Candidate<'a>> = services
        .iter()
        .filter(|s| !s.disabled)
        .filter_map(|service| {
            let lexical_score = score(query, service);
            if lexical_score == 0.0 {
                return None;
            }
            let usage_score = usage_score(service.counter);
            Some(Candidate {
                service,
                lexical_score,
                usage_score,
                total_score: lexical_score + usage_score,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates
}
