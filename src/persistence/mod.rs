//! Progress persistence
//!
//! Features:
//! - Flat JSON record versioned by its storage key
//! - Field-by-field fallback for missing or malformed values
//! - Storage failures are logged and never interrupt a run

use crate::platform::{PlatformError, Storage};
use crate::progress::PersistentProgress;

/// Storage key of the progress record
pub const PROGRESS_STORAGE_KEY: &str = "triangle-arena-progress-v1";

/// In-memory copy of the persistent progress, synced with a [`Storage`]
#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    pub data: PersistentProgress,
    saves: u32,
}

impl ProgressStore {
    pub fn new(data: PersistentProgress) -> Self {
        Self { data, saves: 0 }
    }

    /// Load the record, keeping defaults for anything unusable
    pub fn load(&mut self, storage: &mut dyn Storage) {
        self.data = match storage.load_json(PROGRESS_STORAGE_KEY) {
            Ok(Some(raw)) => PersistentProgress::hydrate(&raw),
            Ok(None) => {
                log::info!("No saved progress, starting fresh");
                PersistentProgress::default()
            }
            Err(err) => {
                log::warn!("Progress load failed: {}", err);
                PersistentProgress::default()
            }
        };
    }

    pub fn try_save(&mut self, storage: &mut dyn Storage) -> Result<(), PlatformError> {
        let value = serde_json::to_value(&self.data)?;
        storage.save_json(PROGRESS_STORAGE_KEY, &value)?;
        self.saves += 1;
        Ok(())
    }

    /// Save, logging failures. Returns whether the write went through.
    pub fn save(&mut self, storage: &mut dyn Storage) -> bool {
        match self.try_save(storage) {
            Ok(()) => {
                log::debug!("Progress saved (credits {})", self.data.credits);
                true
            }
            Err(err) => {
                log::warn!("Progress save failed: {}", err);
                false
            }
        }
    }

    /// Successful saves so far
    pub fn save_count(&self) -> u32 {
        self.saves
    }
}
