use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::state::BaselineState;
use crate::error::AirQualityError;

/// Durable home of the baseline window
///
/// Implementations provide the fallible `try_load`/`try_save`; callers use
/// `load`/`save`, which never fail: a missing or malformed store yields an
/// empty state and a failed write is only logged.
pub trait BaselineStore: Send + Sync {
    /// Read the persisted state, `Ok(None)` when nothing has been stored yet
    fn try_load(&self) -> Result<Option<BaselineState>, AirQualityError>;

    /// Persist the full state
    fn try_save(&self, state: &BaselineState) -> Result<(), AirQualityError>;

    /// Human readable location for logging
    fn describe(&self) -> String;

    fn load(&self) -> BaselineState {
        match self.try_load() {
            Ok(Some(state)) => match state.check_invariants() {
                Ok(()) => {
                    tracing::info!(
                        "Loaded baseline data from {}: {} readings",
                        self.describe(),
                        state.readings.len()
                    );
                    state
                }
                Err(reason) => {
                    tracing::warn!(
                        "Discarding malformed baseline data from {}: {}",
                        self.describe(),
                        reason
                    );
                    BaselineState::new()
                }
            },
            Ok(None) => {
                tracing::info!("No baseline data at {}, starting fresh", self.describe());
                BaselineState::new()
            }
            Err(e) => {
                tracing::warn!("Could not load baseline data from {}: {}", self.describe(), e);
                BaselineState::new()
            }
        }
    }

    /// Returns whether the write succeeded
    fn save(&self, state: &BaselineState) -> bool {
        match self.try_save(state) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Could not save baseline data to {}: {}", self.describe(), e);
                false
            }
        }
    }
}

/// JSON document on the local filesystem
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BaselineStore for JsonFileStore {
    fn try_load(&self) -> Result<Option<BaselineState>, AirQualityError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&contents)?;
        Ok(Some(state))
    }

    fn try_save(&self, state: &BaselineState) -> Result<(), AirQualityError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash never leaves a truncated document behind
        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec(state)?)?;
        fs::rename(&temp, &self.path)?;

        tracing::trace!("Saved {} readings to {:?}", state.readings.len(), self.path);
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local store, used when persistence is disabled and in tests
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<BaselineState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last saved state, if any
    pub fn snapshot(&self) -> Option<BaselineState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl BaselineStore for MemoryStore {
    fn try_load(&self) -> Result<Option<BaselineState>, AirQualityError> {
        Ok(self.snapshot())
    }

    fn try_save(&self, state: &BaselineState) -> Result<(), AirQualityError> {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
