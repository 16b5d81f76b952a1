use std::sync::Arc;
use tracing::{debug, warn};

use super::model::JobConfiguration;
use crate::storage::{KeyValueStore, StorageError, DRAFT_KEY};

/// Persists the in-progress job configuration in its storage slot
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, config: &JobConfiguration) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(config)?;
        self.store.set(DRAFT_KEY, &encoded)?;
        debug!("Saved draft for job name={:?}", config.name);
        Ok(())
    }

    /// Load the saved draft.
    ///
    /// Unreadable or malformed drafts are logged and reported as absent.
    pub fn load(&self) -> Option<JobConfiguration> {
        let raw = match self.store.get(DRAFT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read draft: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring malformed draft: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(DRAFT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use crate::wizard::model::{FieldMapping, JobSchedule, ScheduleFrequency};
    use chrono::{TimeZone, Utc};

    fn sample() -> JobConfiguration {
        JobConfiguration {
            name: "Account Sync".to_string(),
            description: "Nightly production to sandbox".to_string(),
            selected_object: Some("Account".to_string()),
            field_mappings: vec![FieldMapping {
                source_field: "Name".to_string(),
                target_field: "Name".to_string(),
                transformation: Some("trim".to_string()),
            }],
            schedule: JobSchedule {
                frequency: ScheduleFrequency::Weekly,
                start_at: Some(Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()),
            },
            ..Default::default()
        }
    }

    #[test]
    fn saved_draft_loads_back_equal() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()));
        assert!(drafts.load().is_none());

        drafts.save(&sample()).unwrap();
        assert_eq!(drafts.load(), Some(sample()));
    }

    #[test]
    fn draft_survives_a_new_file_store() {
        let dir = tempfile::tempdir().unwrap();
        DraftStore::new(Arc::new(FileStore::open(dir.path()).unwrap()))
            .save(&sample())
            .unwrap();

        let reopened = DraftStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        assert_eq!(reopened.load(), Some(sample()));
    }

    #[test]
    fn malformed_draft_is_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(DRAFT_KEY, "{\"name\": 42").unwrap();
        let drafts = DraftStore::new(store);
        assert!(drafts.load().is_none());
    }

    #[test]
    fn clear_removes_the_draft() {
        let drafts = DraftStore::new(Arc::new(MemoryStore::new()));
        drafts.save(&sample()).unwrap();
        drafts.clear().unwrap();
        assert!(drafts.load().is_none());
        drafts.clear().unwrap();
    }
}
