//! Store profile editing.
//!
//! The partner edits the managed store's name and description. Submitting
//! updates the cached store optimistically, sends the update, and reports
//! the outcome as a `Notification`. A failed update restores the cached
//! store to what it was before the edit.

pub mod form;
pub mod notification;
pub mod service;

pub use form::StoreProfileForm;
pub use notification::{Notification, NotificationLevel};
pub use service::{StoreProfileService, SubmitOutcome};
