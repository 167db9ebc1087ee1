//! Core library for the Pizza Pro partner dashboard.
//!
//! - `api`: HTTP client for the partner API
//! - `cache`: keyed client-side query cache
//! - `mutation`: optimistic writes with rollback on failure
//! - `profile`: the store profile editing flow
//! - `models`, `config`

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod mutation;
pub mod profile;

pub use api::{ApiClient, ApiError, StoreProfileRemote};
pub use cache::{CacheManager, QueryKey, StaleTime};
pub use config::Config;
pub use mutation::{MutationCoordinator, Patch, Snapshot};
pub use profile::{Notification, StoreProfileForm, StoreProfileService, SubmitOutcome};
