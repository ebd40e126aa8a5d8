//! Load/save/purge of the weather snapshot file

use std::fs;
use std::path::{Path, PathBuf};

use atmo_core::{codec, WeatherRecord};
use tracing::{info, warn};

use crate::StoreResult;

/// Default canonical path for the persisted aggregate.
pub const DEFAULT_DATA_PATH: &str = "resources/weather_data.json";

/// Persistent store for the full array of current records.
#[derive(Debug)]
pub struct SnapshotStore {
    data_path: PathBuf,
    temp_path: PathBuf,
}

impl SnapshotStore {
    /// Create a store over `data_path`. The temp path is a sibling with a
    /// `.tmp` extension so the rename in [`save`](Self::save) stays on one
    /// filesystem volume.
    pub fn open(data_path: impl Into<PathBuf>) -> Self {
        let data_path = data_path.into();
        let temp_path = data_path.with_extension("tmp");
        Self {
            data_path,
            temp_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.data_path
    }

    /// Load the current snapshot.
    ///
    /// A missing or empty file is an empty aggregate. A snapshot that no
    /// longer parses is logged and treated as empty rather than taking the
    /// pipeline down; the next save replaces it.
    pub fn load(&self) -> Vec<WeatherRecord> {
        let content = match fs::read_to_string(&self.data_path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        if content.trim().is_empty() {
            return Vec::new();
        }
        match codec::decode_records(content.as_bytes()) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.data_path.display(), error = %e, "failed to parse snapshot, treating as empty");
                Vec::new()
            }
        }
    }

    /// Persist the full aggregate with atomic replacement: serialize to the
    /// sibling temp file, then rename it over the canonical path.
    pub fn save(&self, records: &[WeatherRecord]) -> StoreResult<()> {
        let json = codec::encode_records(records)?;

        if let Some(parent) = self.data_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.temp_path, json)?;
        fs::rename(&self.temp_path, &self.data_path)?;
        Ok(())
    }

    /// Delete the canonical file if present. Runs during shutdown.
    pub fn purge(&self) {
        match fs::remove_file(&self.data_path) {
            Ok(()) => info!(path = %self.data_path.display(), "snapshot purged"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.data_path.display(), error = %e, "failed to purge snapshot"),
        }
    }
}
