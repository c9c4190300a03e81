//! Config, roster, and script files plus atomic writes
//!
//! Everything on disk is JSON. Writes go through a temp file and a rename so
//! a crash never leaves a half-written config behind.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::SimConfig;
use super::error::{StorageError, StorageResult};
use super::script::Script;
use super::types::AgentProfile;

/// Default config file name
pub const CONFIG_FILE: &str = "config.json";

fn write_failed(path: &Path, step: &str, err: io::Error) -> StorageError {
    StorageError::AtomicWriteFailed {
        path: path.to_path_buf(),
        detail: format!("{}: {}", step, err),
    }
}

/// File helper rooted at a directory
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a new storage helper
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Resolve a possibly relative path against the root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Write data atomically to a file
    ///
    /// Creates a temporary file, writes the data, syncs, then renames
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let temp_path = path.with_extension("tmp");

        let mut file =
            File::create(&temp_path).map_err(|e| write_failed(path, "create temp file", e))?;
        file.write_all(data).map_err(|e| write_failed(path, "write data", e))?;
        file.sync_all().map_err(|e| write_failed(path, "sync file", e))?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|e| write_failed(path, "rename temp file", e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir = OpenOptions::new().read(true).open(parent)?;
            dir.sync_all()?;
        }

        Ok(())
    }

    /// Read and decode a JSON file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> StorageResult<T> {
        let path = self.resolve(path);
        let data = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::PathNotFound(path.clone()),
            _ => StorageError::Io(e),
        })?;
        serde_json::from_slice(&data).map_err(|source| StorageError::InvalidJson { path, source })
    }

    /// Encode and atomically write a JSON file
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<()> {
        let path = self.resolve(path);
        let json = serde_json::to_vec_pretty(value)?;
        self.write_atomic(&path, &json)
    }
}

/// Write a simulator configuration into `root`
pub fn write_config(root: &Path, config: &SimConfig) -> StorageResult<()> {
    let storage = Storage::new(root.to_path_buf());
    fs::create_dir_all(root)?;
    storage.write_json(&storage.config_path(), config)
}

/// Load a simulator configuration from `root`
pub fn load_config(root: &Path) -> StorageResult<SimConfig> {
    let storage = Storage::new(root.to_path_buf());
    storage.read_json(&storage.config_path())
}

/// Load agent profiles from a JSON roster file
pub fn load_roster(path: &Path) -> StorageResult<Vec<AgentProfile>> {
    Storage::new(PathBuf::new()).read_json(path)
}

/// Load a script from a JSON file
pub fn load_script(path: &Path) -> StorageResult<Script> {
    Storage::new(PathBuf::new()).read_json(path)
}
