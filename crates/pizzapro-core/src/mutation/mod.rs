//! Optimistic mutations over the query cache.
//!
//! A mutation writes its new value into the cache before the remote write
//! is sent, so every reader sees the edit immediately. The value that was
//! cached before the write is captured in a `Snapshot`; if the remote write
//! fails the snapshot is put back.
//!
//! The protocol has two phases:
//!
//! 1. `begin_mutation` snapshots the entry and applies the speculative value
//! 2. once the remote call settles, `commit_mutation` on success or
//!    `rollback_mutation` on failure
//!
//! `MutationCoordinator::mutate` runs both phases around a remote call.
//! Callers must not start a second mutation for a key while one is in
//! flight; the coordinator reports pending mutations but doesn't reject them.

pub mod coordinator;

pub use coordinator::{MutationCoordinator, Patch, Snapshot};
