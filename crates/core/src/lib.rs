pub mod config;
pub mod domain;
pub mod index;
pub mod resolver;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use domain::{Bookmark, Prober, Query, Realm, Service};
pub use index::MemoryIndex;
pub use resolver::{Resolver, ResolverOptions};
pub use scheduler::{BookmarkReloader, CacheSyncer, GarbageCollector, ServiceReloader};
pub use store::{CacheStore, RedisStore, StoreError};
