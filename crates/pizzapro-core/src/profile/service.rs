use anyhow::Result;
use tracing::{error, info};

use crate::api::StoreProfileRemote;
use crate::cache::{CacheManager, QueryKey, StaleTime};
use crate::models::{ManagedStore, StoreProfileUpdate};
use crate::mutation::{MutationCoordinator, Patch};

use super::{Notification, StoreProfileForm};

const UPDATE_SUCCEEDED: &str = "Profile updated successfully!";
const UPDATE_FAILED: &str = "There was an error updating, no changes were made.";

/// Name and description replace the cached values; every other field of
/// the store is kept. An unloaded store can't be patched.
impl Patch<ManagedStore> for StoreProfileUpdate {
    fn apply(&self, current: Option<&ManagedStore>) -> Option<ManagedStore> {
        current.map(|store| ManagedStore {
            name: self.name.clone(),
            description: self.description.clone(),
            ..store.clone()
        })
    }
}

/// Result of submitting the profile dialog. The dialog closes after either
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub succeeded: bool,
    pub notification: Notification,
}

/// Loads the managed store and applies profile edits to it.
pub struct StoreProfileService<R> {
    remote: R,
    coordinator: MutationCoordinator<ManagedStore>,
}

impl<R: StoreProfileRemote> StoreProfileService<R> {
    pub fn new(remote: R, cache: CacheManager<ManagedStore>) -> Self {
        Self {
            remote,
            coordinator: MutationCoordinator::new(cache),
        }
    }

    pub fn cache(&self) -> &CacheManager<ManagedStore> {
        self.coordinator.cache()
    }

    /// The cached store, without fetching.
    pub fn cached_store(&self) -> Option<ManagedStore> {
        self.cache().get(&QueryKey::managed_store())
    }

    /// The managed store, fetched once and then served from the cache.
    pub async fn managed_store(&self) -> Result<ManagedStore> {
        self.cache()
            .fetch_query(&QueryKey::managed_store(), StaleTime::Infinite, || {
                self.remote.fetch_managed_store()
            })
            .await
    }

    /// Dialog values for the current cache contents.
    pub fn form(&self) -> StoreProfileForm {
        StoreProfileForm::from_cache(self.cached_store().as_ref())
    }

    /// True while an update is in flight; the dialog's buttons are disabled
    /// meanwhile.
    pub fn is_submitting(&self) -> bool {
        self.coordinator.is_mutating(&QueryKey::managed_store())
    }

    /// Submit the dialog.
    ///
    /// The cached store shows the new values before the update is sent. If
    /// the update fails the cached store is restored. Errors are reported
    /// through the returned notification and never propagated.
    pub async fn submit(&self, form: StoreProfileForm) -> SubmitOutcome {
        let update = form.into_update();
        let key = QueryKey::managed_store();

        let result = self
            .coordinator
            .mutate(&key, &update, || self.remote.update_profile(&update))
            .await;

        match result {
            Ok(()) => {
                info!(name = %update.name, "Store profile updated");
                SubmitOutcome {
                    succeeded: true,
                    notification: Notification::success(UPDATE_SUCCEEDED),
                }
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Store profile update failed");
                SubmitOutcome {
                    succeeded: false,
                    notification: Notification::error(UPDATE_FAILED),
                }
            }
        }
    }
}
