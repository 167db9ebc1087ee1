//! Models for the partner's managed store and its editable profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The store (restaurant) managed by the signed-in partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ManagedStore {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ManagedStore {
    pub fn description_display(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => "(no description)",
        }
    }

    /// The editable fields of this store.
    pub fn profile(&self) -> StoreProfileUpdate {
        StoreProfileUpdate {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Body of the update-profile call.
///
/// `description` is nullable: `None` is sent as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StoreProfileUpdate {
    pub name: String,
    pub description: Option<String>,
}

impl StoreProfileUpdate {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}
