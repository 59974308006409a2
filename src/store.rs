// Config store: the saved APIs live in one JSON array on disk.
//
// The location is injected so tests can point at a temp dir. The binary
// takes it from `--store` / `CHAYAN_STORE` and otherwise falls back to
// `ConfigStore::default_path`, `~/.chayan/apis.json`.
//
// Saving is read-modify-write without any lock. Two chayan processes
// saving at the same time can lose one of the appends.

use crate::error::StoreError;
use crate::models::ApiConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const STORE_DIR: &str = ".chayan";
const STORE_FILE: &str = "apis.json";

/// What a save found on disk before appending.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Vec<ApiConfig>),
    /// No store file yet.
    Empty,
    /// A file exists but could not be read or parsed. Saving on top of it
    /// drops its previous content.
    CorruptExisting { error: StoreError },
}

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Number of records in the store after the save.
    pub total: usize,
    /// The previous file could not be parsed and was replaced.
    pub discarded_corrupt: bool,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    /// `~/.chayan/apis.json`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::HomeDirUnavailable)?;
        Ok(home.join(STORE_DIR).join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every saved API in insertion order.
    pub fn load_all(&self) -> Result<Vec<ApiConfig>, StoreError> {
        let data = fs::read(&self.path).map_err(|source| StoreError::FileAccess {
            path: self.path.clone(),
            source,
        })?;
        let configs: Vec<ApiConfig> =
            serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), count = configs.len(), "loaded saved APIs");
        Ok(configs)
    }

    /// Like `load_all` but tells "nothing saved yet" apart from a broken file.
    pub fn load_existing(&self) -> LoadOutcome {
        match self.load_all() {
            Ok(configs) => LoadOutcome::Loaded(configs),
            Err(e) if e.is_missing_file() => LoadOutcome::Empty,
            Err(error) => LoadOutcome::CorruptExisting { error },
        }
    }

    /// First saved API called `name`. Names are not unique.
    pub fn load_by_name(&self, name: &str) -> Result<ApiConfig, StoreError> {
        let all = match self.load_all() {
            Ok(all) => all,
            Err(e) => {
                debug!(error = %e, "lookup on unreadable store");
                return Err(StoreError::NotFound(name.to_string()));
            }
        };
        all.into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Append `cfg` and rewrite the whole file.
    pub fn save(&self, cfg: ApiConfig) -> Result<SaveReport, StoreError> {
        let (mut configs, discarded_corrupt) = match self.load_existing() {
            LoadOutcome::Loaded(configs) => (configs, false),
            LoadOutcome::Empty => (Vec::new(), false),
            LoadOutcome::CorruptExisting { error } => {
                warn!(error = %error, "existing store is unreadable, starting from empty");
                (Vec::new(), true)
            }
        };
        configs.push(cfg);

        let data = serde_json::to_vec_pretty(&configs)?;
        self.write_replace(&data)?;
        debug!(path = %self.path.display(), count = configs.len(), "saved APIs written");

        Ok(SaveReport {
            total: configs.len(),
            discarded_corrupt,
        })
    }

    // Write to a sibling temp file then rename over the target.
    fn write_replace(&self, data: &[u8]) -> Result<(), StoreError> {
        let access = |source| StoreError::FileAccess {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(access)?;
        }
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        let result = fs::write(&tmp, data).and_then(|()| fs::rename(&tmp, &self.path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result.map_err(access)
    }
}
