/// The search space a query is routed to, selected by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realm {
    /// Plain text without a dot: match against top-level hostname labels.
    Service,
    /// Text containing a dot: subdomain matching is required.
    Subdomain,
    /// Leading `/`: fuzzy lookup over the fixed set of admin endpoints.
    Internal,
    /// Leading `@`: match against bookmark labels.
    Bookmark,
    /// Nothing left after trimming.
    Empty,
}

/// A parsed user input.
///
/// `raw` is the full trimmed, lowercased input. `term` is the realm-specific
/// matching text: for the bookmark realm the `@` prefix is stripped, for the
/// internal realm the leading `/` is kept so it lines up with endpoint paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw: String,
    pub realm: Realm,
    pub term: String,
    /// Tokens before the first dot (or all tokens when there is no dot).
    pub top_level_fragments: Vec<String>,
    /// Tokens after the first dot (empty when there is no dot).
    pub subdomain_fragments: Vec<String>,
    pub has_dot: bool,
}

/// Parse user input into a structured query.
///
/// Examples:
/// - `"jelly pro"` — service realm, unordered top-level tokens
/// - `"jelly.prod"` — subdomain realm, `["jelly"]` + `["prod"]`
/// - `"@docker hub"` — bookmark realm, term `docker hub`
/// - `"/inf"` — internal realm
pub fn parse_query(input: &str) -> Query {
    let raw = input.trim().to_lowercase();

    if raw.is_empty() {
        return Query {
            raw,
            realm: Realm::Empty,
            term: String::new(),
            top_level_fragments: Vec::new(),
            subdomain_fragments: Vec::new(),
            has_dot: false,
        };
    }

    if let Some(rest) = raw.strip_prefix('@') {
        let term = rest.trim().to_string();
        return Query {
            raw,
            realm: Realm::Bookmark,
            term,
            top_level_fragments: Vec::new(),
            subdomain_fragments: Vec::new(),
            has_dot: false,
        };
    }

    if raw.starts_with('/') {
        return Query {
            term: raw.clone(),
            raw,
            realm: Realm::Internal,
            top_level_fragments: Vec::new(),
            subdomain_fragments: Vec::new(),
            has_dot: false,
        };
    }

    let has_dot = raw.contains('.');
    let (top_level_fragments, subdomain_fragments) = if has_dot {
        let mut parts = raw.split('.');
        let top = parts.next().map(split_and_clean).unwrap_or_default();
        let sub = parts.flat_map(|p| split_and_clean(p)).collect();
        (top, sub)
    } else {
        (split_and_clean(&raw), Vec::new())
    };

    Query {
        term: raw.clone(),
        raw,
        realm: if has_dot {
            Realm::Subdomain
        } else {
            Realm::Service
        },
        top_level_fragments,
        subdomain_fragments,
        has_dot,
    }
}

/// Split on whitespace and drop empty tokens.
fn split_and_clean(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Split a hostname into its DNS labels, lowercased.
pub(crate) fn hostname_fragments(hostname: &str) -> Vec<String> {
    hostname.to_lowercase().split('.').map(str::to_string).collect()
}

/// Reduce a fragment to `[a-z0-9]` for matching.
pub(crate) fn normalize_fragment(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_realm() {
        let q = parse_query("   ");
        assert_eq!(q.realm, Realm::Empty);
        assert!(q.raw.is_empty());
    }

    #[test]
    fn plain_text_is_service_realm() {
        let q = parse_query("Jelly Pro");
        assert_eq!(q.realm, Realm::Service);
        assert!(!q.has_dot);
        assert_eq!(q.top_level_fragments, vec!["jelly", "pro"]);
        assert!(q.subdomain_fragments.is_empty());
    }

    #[test]
    fn dot_switches_to_subdomain_realm() {
        let q = parse_query("jelly.prod");
        assert_eq!(q.realm, Realm::Subdomain);
        assert!(q.has_dot);
        assert_eq!(q.top_level_fragments, vec!["jelly"]);
        assert_eq!(q.subdomain_fragments, vec!["prod"]);
    }

    #[test]
    fn dots_and_spaces_combine() {
        let q = parse_query("jelly.srv sta");
        assert_eq!(q.top_level_fragments, vec!["jelly"]);
        assert_eq!(q.subdomain_fragments, vec!["srv", "sta"]);
    }

    #[test]
    fn multiple_dots_all_feed_subdomain_fragments() {
        let q = parse_query("adguard.ha.prod");
        assert_eq!(q.top_level_fragments, vec!["adguard"]);
        assert_eq!(q.subdomain_fragments, vec!["ha", "prod"]);
    }

    #[test]
    fn trailing_dot_leaves_subdomain_fragments_empty() {
        let q = parse_query("jellyfin.");
        assert_eq!(q.realm, Realm::Subdomain);
        assert!(q.has_dot);
        assert_eq!(q.top_level_fragments, vec!["jellyfin"]);
        assert!(q.subdomain_fragments.is_empty());
    }

    #[test]
    fn at_prefix_is_bookmark_realm() {
        let q = parse_query("@ Docker Hub ");
        assert_eq!(q.realm, Realm::Bookmark);
        assert_eq!(q.term, "docker hub");
    }

    #[test]
    fn bare_at_is_bookmark_with_empty_term() {
        let q = parse_query("@");
        assert_eq!(q.realm, Realm::Bookmark);
        assert!(q.term.is_empty());
    }

    #[test]
    fn slash_prefix_is_internal_realm() {
        let q = parse_query("/Inf");
        assert_eq!(q.realm, Realm::Internal);
        assert_eq!(q.term, "/inf");
    }

    #[test]
    fn normalize_fragment_drops_non_alphanumerics() {
        assert_eq!(normalize_fragment("ad-guard_01!"), "adguard01");
        assert_eq!(normalize_fragment("ABC"), "abc");
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse_query("  Jelly.Prod "), parse_query("jelly.prod"));
    }
}
