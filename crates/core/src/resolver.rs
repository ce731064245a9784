//! The hot path: query → best live match → redirect target.
//!
//! Every query resolves to a redirect location. Failures along the way
//! (cache down, dead candidates, empty index) fall through to the next
//! candidate or to the configured home URL; nothing here surfaces an
//! error to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{
    parse_query, rank_bookmark_candidates, rank_candidates, Prober, Query, Realm,
};
use crate::index::MemoryIndex;
use crate::store::CacheStore;

/// Admin endpoints reachable through the `/` query prefix.
const INTERNAL_ENDPOINTS: &[&str] = &["/infra", "/healthz", "/readyz"];

/// Resolver configuration, derived from the process config at startup.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Redirect target for empty and unmatched queries.
    pub home_url: String,
    /// Domains redirects may point at; see [`ResolverOptions::is_allowed`].
    pub allowed_domains: Vec<String>,
    /// Upper bound on probed candidates. Zero means unlimited.
    pub max_candidates: usize,
    /// TTL for write-through resolution caching.
    pub cache_ttl: Duration,
    /// Deadline applied to each cache operation on the hot path.
    pub op_timeout: Duration,
}

impl ResolverOptions {
    /// A hostname is allowed iff it equals an allowed domain or sits under
    /// one, case-insensitively.
    pub fn is_allowed(&self, hostname: &str) -> bool {
        let hostname = hostname.to_lowercase();
        self.allowed_domains.iter().any(|domain| {
            let domain = domain.to_lowercase();
            hostname == domain || hostname.ends_with(&format!(".{domain}"))
        })
    }
}

/// Routes queries across realms and produces the redirect location.
pub struct Resolver {
    index: Arc<MemoryIndex>,
    store: Option<Arc<dyn CacheStore>>,
    prober: Prober,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(
        index: Arc<MemoryIndex>,
        store: Option<Arc<dyn CacheStore>>,
        prober: Prober,
        options: ResolverOptions,
    ) -> Self {
        Self {
            index,
            store,
            prober,
            options,
        }
    }

    pub fn home_url(&self) -> &str {
        &self.options.home_url
    }

    /// Resolve raw user input into a redirect location.
    ///
    /// `request_host` is the Host header of the incoming request, used for
    /// internal-endpoint redirects.
    pub async fn resolve(&self, raw_query: &str, request_host: &str) -> String {
        let query = parse_query(raw_query);

        match query.realm {
            Realm::Empty => {
                debug!("empty query, redirecting home");
                self.options.home_url.clone()
            }
            Realm::Bookmark => self.resolve_bookmark(&query),
            Realm::Internal => self.resolve_internal(&query, request_host),
            Realm::Service | Realm::Subdomain => self.resolve_service(&query).await,
        }
    }

    fn resolve_bookmark(&self, query: &Query) -> String {
        if query.term.is_empty() {
            debug!("empty bookmark query, redirecting home");
            return self.options.home_url.clone();
        }

        let bookmarks = self.index.all_bookmarks();
        if bookmarks.is_empty() {
            warn!("no bookmarks available in index");
            return self.options.home_url.clone();
        }

        let candidates = rank_bookmark_candidates(&query.term, &bookmarks);
        let Some(best) = candidates.first() else {
            info!(term = %query.term, "no matching bookmarks");
            return self.options.home_url.clone();
        };

        info!(
            term = %query.term,
            abbr = %best.bookmark.abbr,
            url = %best.bookmark.url,
            score = best.score,
            "resolved bookmark"
        );
        // External URLs: no probing, no allow-list.
        best.bookmark.url.clone()
    }

    fn resolve_internal(&self, query: &Query, request_host: &str) -> String {
        let matches: Vec<&&str> = INTERNAL_ENDPOINTS
            .iter()
            .filter(|endpoint| endpoint.starts_with(&query.term))
            .collect();

        // Only an unambiguous match redirects.
        if let [endpoint] = matches.as_slice() {
            info!(term = %query.term, endpoint = %endpoint, "internal endpoint redirect");
            return format!("https://{request_host}{endpoint}");
        }

        debug!(term = %query.term, "no unique internal endpoint match");
        self.options.home_url.clone()
    }

    async fn resolve_service(&self, query: &Query) -> String {
        if let Some(location) = self.try_cached(query).await {
            return location;
        }

        let services = self.index.all_services();
        if services.is_empty() {
            warn!("no services available in index");
            return self.options.home_url.clone();
        }

        let mut candidates = rank_candidates(query, &services);
        if candidates.is_empty() {
            info!(query = %query.raw, "no matching services");
            return self.options.home_url.clone();
        }

        if self.options.max_candidates > 0 && candidates.len() > self.options.max_candidates {
            debug!(
                total = candidates.len(),
                max = self.options.max_candidates,
                "limiting candidates"
            );
            candidates.truncate(self.options.max_candidates);
        }

        for (rank, candidate) in candidates.iter().enumerate() {
            let hostname = &candidate.service.hostname;

            if !self.options.is_allowed(hostname) {
                debug!(hostname = %hostname, "skipping candidate outside allowed domains");
                continue;
            }

            if let Err(e) = self.prober.probe(hostname).await {
                debug!(hostname = %hostname, error = %e, "candidate failed liveness probe");
                continue;
            }

            info!(
                query = %query.raw,
                hostname = %hostname,
                score = candidate.total_score,
                rank = rank + 1,
                "resolved service"
            );

            self.record_success(query, hostname);
            return format!("https://{hostname}");
        }

        warn!(query = %query.raw, "no healthy service for query");
        self.options.home_url.clone()
    }

    /// Try the cached resolution. Returns the redirect location on a
    /// validated hit; on a dead or disallowed hit the entry is invalidated
    /// and ranking takes over.
    async fn try_cached(&self, query: &Query) -> Option<String> {
        let store = self.store.as_ref()?;

        let cached = tokio::time::timeout(
            self.options.op_timeout,
            store.cached_resolution(&query.raw),
        )
        .await;

        let hostname = match cached {
            Ok(Ok(Some(hostname))) => hostname,
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                warn!(error = %e, "cache lookup failed");
                return None;
            }
            Err(_) => {
                warn!("cache lookup timed out");
                return None;
            }
        };

        let alive = self.prober.probe(&hostname).await.is_ok();
        if alive && self.options.is_allowed(&hostname) {
            info!(query = %query.raw, hostname = %hostname, "cache hit");
            self.bump_counters(&hostname);
            return Some(format!("https://{hostname}"));
        }

        debug!(query = %query.raw, hostname = %hostname, "cached entry stale, invalidating");
        // Invalidate before ranking takes over so the write-through of the
        // fresh winner cannot be clobbered afterwards.
        match tokio::time::timeout(self.options.op_timeout, store.invalidate_cache(&query.raw))
            .await
        {
            Ok(Err(e)) => warn!(error = %e, "cache invalidation failed"),
            Err(_) => warn!("cache invalidation timed out"),
            Ok(Ok(())) => {}
        }
        None
    }

    /// Usage and cache write-through after a validated redirect. Counter
    /// and cache writes are fire-and-forget: they never delay the response
    /// and their failures never change it.
    fn record_success(&self, query: &Query, hostname: &str) {
        self.bump_counters(hostname);

        if let Some(store) = &self.store {
            let store = Arc::clone(store);
            let raw = query.raw.clone();
            let hostname = hostname.to_string();
            let ttl = self.options.cache_ttl;
            tokio::spawn(async move {
                if let Err(e) = store.cache_resolution(&raw, &hostname, ttl).await {
                    warn!(error = %e, "resolution write-through failed");
                }
            });
        }
    }

    fn bump_counters(&self, hostname: &str) {
        self.index.increment_counter(hostname);

        if let Some(store) = &self.store {
            let store = Arc::clone(store);
            let hostname = hostname.to_string();
            tokio::spawn(async move {
                if let Err(e) = store.update_service_counter(&hostname).await {
                    debug!(error = %e, "usage counter write-through failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bookmark, Service};
    use crate::source::bookmark_id;
    use crate::testing::MemoryStore;
    use chrono::Utc;

    const HOME: &str = "https://home.example.com";

    fn service(hostname: &str, counter: u64) -> Service {
        let mut svc = Service::from_catalog(hostname, Utc::now());
        svc.counter = counter;
        svc
    }

    fn bookmark(abbr: &str, url: &str) -> Bookmark {
        Bookmark {
            id: bookmark_id(url),
            abbr: abbr.to_string(),
            url: url.to_string(),
            sources: vec!["catalog".to_string()],
            created_at: None,
            updated_at: None,
            disabled: false,
        }
    }

    fn seeded_index() -> Arc<MemoryIndex> {
        let index = Arc::new(MemoryIndex::new());
        index.update_services(vec![
            service("adguard.example.com", 10),
            service("adguard.ha.example.com", 0),
            service("jellyfin.example.com", 20),
            service("jellyseerr.example.com", 0),
            service("traefik.example.com", 0),
        ]);
        index.update_bookmarks(vec![
            bookmark("ChatGPT", "https://chat.openai.com/"),
            bookmark("Docker Hub", "https://hub.docker.com/"),
        ]);
        index
    }

    fn resolver(index: Arc<MemoryIndex>, store: Option<Arc<MemoryStore>>) -> Resolver {
        let store = store.map(|s| s as Arc<dyn CacheStore>);
        let prober = Prober::new(Duration::from_millis(100), true).unwrap();
        Resolver::new(
            index,
            store,
            prober,
            ResolverOptions {
                home_url: HOME.to_string(),
                allowed_domains: vec!["example.com".to_string()],
                max_candidates: 3,
                cache_ttl: Duration::from_secs(60),
                op_timeout: Duration::from_millis(100),
            },
        )
    }

    async fn settle() {
        // Let fire-and-forget writes land before asserting on the store.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn end_to_end_scenarios() {
        let r = resolver(seeded_index(), None);

        let cases = [
            ("jellyfin", "https://jellyfin.example.com"),
            ("je", "https://jellyfin.example.com"),
            ("adguard.ha", "https://adguard.ha.example.com"),
            ("trfk", "https://traefik.example.com"),
            ("@chat", "https://chat.openai.com/"),
            ("/inf", "https://jump.example.com/infra"),
            ("", HOME),
            ("nothinglikeanything", HOME),
        ];

        for (query, expected) in cases {
            let location = r.resolve(query, "jump.example.com").await;
            assert_eq!(location, expected, "query {query:?}");
        }
    }

    #[tokio::test]
    async fn bookmark_realm_with_empty_term_goes_home() {
        let r = resolver(seeded_index(), None);
        assert_eq!(r.resolve("@", "jump.example.com").await, HOME);
        assert_eq!(r.resolve("@   ", "jump.example.com").await, HOME);
    }

    #[tokio::test]
    async fn ambiguous_internal_prefix_goes_home() {
        let r = resolver(seeded_index(), None);
        // Both /healthz and /readyz... nothing starts with /x; "/" matches all.
        assert_eq!(r.resolve("/", "jump.example.com").await, HOME);
        assert_eq!(r.resolve("/zzz", "jump.example.com").await, HOME);
        assert_eq!(
            r.resolve("/h", "jump.example.com").await,
            "https://jump.example.com/healthz"
        );
    }

    #[tokio::test]
    async fn disallowed_candidates_are_skipped() {
        let index = Arc::new(MemoryIndex::new());
        index.update_services(vec![
            service("jellyfin.evil.com", 50),
            service("jellyfin.example.com", 0),
        ]);

        let r = resolver(index, None);
        let location = r.resolve("jellyfin", "jump.example.com").await;
        assert_eq!(location, "https://jellyfin.example.com");
    }

    #[tokio::test]
    async fn successful_resolution_writes_through() {
        let index = seeded_index();
        let store = Arc::new(MemoryStore::new());
        store
            .save_service(&service("jellyfin.example.com", 20))
            .await
            .unwrap();

        let r = resolver(Arc::clone(&index), Some(Arc::clone(&store)));
        let location = r.resolve("  Jellyfin  ", "jump.example.com").await;
        assert_eq!(location, "https://jellyfin.example.com");
        settle().await;

        // The cache key is the normalized query, not the wire bytes.
        let resolutions = store.resolutions().await;
        assert_eq!(
            resolutions.get("jellyfin").map(String::as_str),
            Some("jellyfin.example.com")
        );

        assert_eq!(
            index.get_service("jellyfin.example.com").unwrap().counter,
            21
        );
        let stored = store.get_service("jellyfin.example.com").await.unwrap();
        assert_eq!(stored.counter, 21);
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_ranking() {
        let index = seeded_index();
        let store = Arc::new(MemoryStore::new());
        // Point the cached entry at a different service than ranking would pick.
        store.seed_resolution("je", "jellyseerr.example.com").await;

        let r = resolver(Arc::clone(&index), Some(Arc::clone(&store)));
        let location = r.resolve("je", "jump.example.com").await;
        assert_eq!(location, "https://jellyseerr.example.com");
    }

    #[tokio::test]
    async fn disallowed_cache_entry_is_invalidated_and_reranked() {
        let index = seeded_index();
        let store = Arc::new(MemoryStore::new());
        store.seed_resolution("jellyfin", "jellyfin.evil.com").await;

        let r = resolver(Arc::clone(&index), Some(Arc::clone(&store)));
        let location = r.resolve("jellyfin", "jump.example.com").await;
        assert_eq!(location, "https://jellyfin.example.com");
        settle().await;

        let resolutions = store.resolutions().await;
        assert_eq!(
            resolutions.get("jellyfin").map(String::as_str),
            Some("jellyfin.example.com")
        );
    }

    #[tokio::test]
    async fn cache_outage_degrades_to_ranking() {
        let index = seeded_index();
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);

        let r = resolver(index, Some(store));
        let location = r.resolve("jellyfin", "jump.example.com").await;
        assert_eq!(location, "https://jellyfin.example.com");
    }

    #[tokio::test]
    async fn max_candidates_one_keeps_first_only() {
        let index = Arc::new(MemoryIndex::new());
        // Top-ranked candidate is outside the allow-list; with a candidate
        // cap of one there is nothing left to try.
        index.update_services(vec![
            service("jellyfin.evil.com", 50),
            service("jellyfin.example.com", 0),
        ]);

        let store = None;
        let prober = Prober::new(Duration::from_millis(100), true).unwrap();
        let r = Resolver::new(
            index,
            store,
            prober,
            ResolverOptions {
                home_url: HOME.to_string(),
                allowed_domains: vec!["example.com".to_string()],
                max_candidates: 1,
                cache_ttl: Duration::from_secs(60),
                op_timeout: Duration::from_millis(100),
            },
        );

        assert_eq!(r.resolve("jellyfin", "jump.example.com").await, HOME);
    }

    #[tokio::test]
    async fn empty_index_goes_home() {
        let r = resolver(Arc::new(MemoryIndex::new()), None);
        assert_eq!(r.resolve("anything", "jump.example.com").await, HOME);
    }

    #[tokio::test]
    async fn single_character_query_can_match() {
        let r = resolver(seeded_index(), None);
        let location = r.resolve("j", "jump.example.com").await;
        assert_eq!(location, "https://jellyfin.example.com");
    }
}
