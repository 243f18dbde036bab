//! Durable sync-state store.
//!
//! A small JSON file holding the last acknowledged sync date. The store
//! takes its path from configuration; nothing here resolves paths
//! relative to the process.

use std::fs;
use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SyncError;

#[derive(Debug, Serialize, Deserialize)]
struct SavedState {
    last_sync_date: NaiveDate,
}

/// Tracks the resume boundary between runs.
#[derive(Debug, Clone)]
pub struct SyncStateStore {
    path: PathBuf,
    lookback_days: u64,
}

impl SyncStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, lookback_days: u64) -> Self {
        Self {
            path: path.into(),
            lookback_days,
        }
    }

    /// The date the next run should start from: the day after the last
    /// acknowledged sync. A missing or unreadable state file means a
    /// fresh start from `today - lookback`.
    #[must_use]
    pub fn resume_date(&self, today: NaiveDate) -> NaiveDate {
        let fallback = today
            .checked_sub_days(Days::new(self.lookback_days))
            .unwrap_or(today);
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return fallback,
        };
        match serde_json::from_str::<SavedState>(&raw) {
            Ok(state) => state
                .last_sync_date
                .checked_add_days(Days::new(1))
                .unwrap_or(fallback),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt sync state, falling back to lookback");
                fallback
            }
        }
    }

    /// Persists the new resume boundary. Written to a sibling temp file
    /// and renamed, so a crash mid-write cannot corrupt the state.
    pub fn save(&self, last_sync_date: NaiveDate) -> Result<(), SyncError> {
        let state = SavedState { last_sync_date };
        let body = serde_json::to_string(&state).map_err(|e| SyncError::State {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        let tmp = self.path.with_extension("tmp");
        let write = fs::write(&tmp, body).and_then(|()| fs::rename(&tmp, &self.path));
        write.map_err(|source| SyncError::State {
            path: self.path.clone(),
            source,
        })
    }
}
