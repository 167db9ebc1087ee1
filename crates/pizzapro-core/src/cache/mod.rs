//! Client-side query cache.
//!
//! This module provides the `CacheManager`, a keyed in-memory table shared
//! by every component that reads or writes remote data. Entries live for
//! the whole session; each key holds at most one value and the last writer
//! wins. Absence of an entry means "not yet loaded".
//!
//! Writers broadcast a `CacheEvent` so readers can observe changes as soon
//! as they happen.

pub mod entry;
pub mod manager;

pub use entry::{CachedData, QueryKey, StaleTime};
pub use manager::{CacheEvent, CacheEventKind, CacheManager};
