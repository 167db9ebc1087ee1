use crate::models::{ManagedStore, StoreProfileUpdate};

/// Values of the store profile dialog.
///
/// Fields are pre-filled from the cached store; while the store hasn't
/// loaded they start empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreProfileForm {
    pub name: String,
    pub description: Option<String>,
}

impl StoreProfileForm {
    pub fn from_cache(store: Option<&ManagedStore>) -> Self {
        let StoreProfileUpdate { name, description } = store
            .map(ManagedStore::profile)
            .unwrap_or_else(|| StoreProfileUpdate::new("", None));
        Self {
            name,
            description: Some(description.unwrap_or_default()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `None` submits a null description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn into_update(self) -> StoreProfileUpdate {
        StoreProfileUpdate {
            name: self.name,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ManagedStore {
        ManagedStore {
            id: "rst_01".to_string(),
            name: "Pizzaria A".to_string(),
            description: None,
            manager_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_form_prefills_from_cache() {
        let form = StoreProfileForm::from_cache(Some(&store()));
        assert_eq!(form.name, "Pizzaria A");
        assert_eq!(form.description.as_deref(), Some(""));
    }

    #[test]
    fn test_form_defaults_when_not_loaded() {
        let form = StoreProfileForm::from_cache(None);
        assert_eq!(form.name, "");
        assert_eq!(form.description.as_deref(), Some(""));
    }

    #[test]
    fn test_form_into_update() {
        let update = StoreProfileForm::from_cache(Some(&store()))
            .with_name("Pizzaria B")
            .with_description(None)
            .into_update();
        assert_eq!(update, StoreProfileUpdate::new("Pizzaria B", None));
    }
}
