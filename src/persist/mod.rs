//! Persistence boundary
//!
//! The stores' mutable halves are serialized as one blob to an injected
//! durable medium. Writes replace the whole blob atomically; durability is
//! best-effort and never a condition for the in-memory mutation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::overlay::OverlayState;
use crate::tracking::TrackingState;

pub mod bundle;

pub use bundle::{Bundle, BundleError, APPLICATION_NAME, BUNDLE_VERSION};

/// Everything that survives a restart: the overlay and tracking state.
/// The base catalog is never part of this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub overlay: OverlayState,

    #[serde(default)]
    pub tracking: TrackingState,
}

/// Errors from the durable medium
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt state file: {0}")]
    Format(String),
}

/// An opaque durable medium for the persisted state
pub trait Persistence {
    /// Read the last saved state; `None` when nothing was ever saved
    fn load(&self) -> Result<Option<PersistedState>, PersistError>;

    /// Replace the whole saved state
    fn save(&self, state: &PersistedState) -> Result<(), PersistError>;

    /// Discard the saved state entirely
    fn clear(&self) -> Result<(), PersistError>;
}

/// Whole-file JSON store; each save writes a temp file and renames it over
/// the old state, so a crash mid-write never corrupts the previous blob
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for FileStore {
    fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state =
            serde_json::from_str(&raw).map_err(|e| PersistError::Format(e.to_string()))?;
        Ok(Some(state))
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(state)
            .map_err(|e| PersistError::Format(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory stand-in for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct NullStore;

impl Persistence for NullStore {
    fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        Ok(None)
    }

    fn save(&self, _state: &PersistedState) -> Result<(), PersistError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{CustomMeta, CustomProblem};
    use crate::catalog::Problem;
    use tempfile::tempdir;

    fn sample_state() -> PersistedState {
        let mut state = PersistedState::default();
        state.overlay.custom_problems.push(CustomProblem {
            problem: Problem {
                id: "PROC-9".to_string(),
                area_id: "process".to_string(),
                title: "Saved".to_string(),
                description: String::new(),
                impact: Default::default(),
                urgency: Default::default(),
                causes: vec![],
                evidence: vec![],
                proposed_solution: String::new(),
                implementation_steps: vec![],
                cost: Default::default(),
                roi: Default::default(),
                dependencies: vec![],
                tags: vec![],
            },
            meta: CustomMeta::new("alice"),
        });
        state
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let tmp = tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("state.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("nested/dir/state.json"));
        let state = sample_state();

        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, state);

        // No temp file left behind
        assert!(!tmp.path().join("nested/dir/state.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_reports_format_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(PersistError::Format(_))));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tmp = tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("state.json"));
        store.save(&sample_state()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
