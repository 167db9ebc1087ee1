//! Data models for Pizza Pro partner entities.
//!
//! - `ManagedStore`: the store managed by the signed-in partner
//! - `StoreProfileUpdate`: the editable part of a store profile

pub mod store;

pub use store::{ManagedStore, StoreProfileUpdate};
