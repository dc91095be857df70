//! Content-addressed persistent cache for SentinelDF detector outputs (spec
//! §4.E). Adapted from the teacher's `index::backend::redb::RedbBackend`,
//! split into dedicated `embeddings`/`heuristics`/`meta` tables since the two
//! namespaces are versioned and miss independently.

mod entry;
mod error;
mod key;
mod store;

pub use entry::{EmbeddingEntry, HeuristicEntry};
pub use error::CacheError;
pub use key::{embedding_key, heuristic_key};
pub use store::{CacheStats, PersistentCache, CURRENT_SCHEMA_VERSION};
