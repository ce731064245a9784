//! Cache key layout. These names are part of the external interface and
//! must stay stable across versions.

pub const KEY_PREFIX_SERVICE: &str = "jump:service:";
pub const KEY_PREFIX_BOOKMARK: &str = "jump:bookmark:";
pub const KEY_PREFIX_CACHE: &str = "jump:cache:";
pub const KEY_ALL_SERVICES: &str = "jump:services:all";
pub const KEY_ALL_BOOKMARKS: &str = "jump:bookmarks:all";

/// Key for a service record by id.
pub fn service_key(id: &str) -> String {
    format!("{KEY_PREFIX_SERVICE}{id}")
}

/// Key for a bookmark record by id.
pub fn bookmark_key(id: &str) -> String {
    format!("{KEY_PREFIX_BOOKMARK}{id}")
}

/// Key for a cached query resolution.
pub fn cache_key(query: &str) -> String {
    format!("{KEY_PREFIX_CACHE}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_the_stable_layout() {
        assert_eq!(
            service_key("jellyfin.example.com"),
            "jump:service:jellyfin.example.com"
        );
        assert_eq!(bookmark_key("a1b2c3d4e5f60718"), "jump:bookmark:a1b2c3d4e5f60718");
        assert_eq!(cache_key("jelly"), "jump:cache:jelly");
    }
}
