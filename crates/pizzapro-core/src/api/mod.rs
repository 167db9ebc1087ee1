//! REST API client module for the Pizza Pro partner API.
//!
//! This module provides the `ApiClient` for communicating with the
//! partner API: reading the managed store and updating its profile.
//! The `StoreProfileRemote` trait is the seam the mutation flow is
//! written against, so it can run over any remote.

pub mod client;
pub mod error;

pub use client::{ApiClient, StoreProfileRemote};
pub use error::ApiError;
