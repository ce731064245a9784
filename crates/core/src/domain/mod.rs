//! Domain model for the resolution pipeline.
//!
//! This module contains the catalog entities (`Service`, `Bookmark`), the
//! query parser, the scoring functions used to rank candidates, and the
//! TLS reachability prober.

mod bookmark;
mod bookmark_scoring;
mod probe;
mod query;
mod scoring;
mod service;

pub use bookmark::Bookmark;
pub use bookmark_scoring::{rank_bookmark_candidates, score_bookmark, BookmarkCandidate};
pub use probe::{ProbeError, Prober};
pub use query::{parse_query, Query, Realm};
pub use scoring::{rank_candidates, score, Candidate};
pub use service::Service;
