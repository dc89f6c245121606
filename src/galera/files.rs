//! Access to the MariaDB config and state directories
//!
//! Supports the real filesystem and an in-memory backend. Every operation is
//! scoped to one of two roots: config files (`*.cnf`) and state files (Galera
//! markers in the data directory).

use crate::common::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Local config and state files
pub trait StateStore: Send + Sync {
    fn config_file_exists(&self, name: &str) -> Result<bool>;
    fn read_config_file(&self, name: &str) -> Result<Vec<u8>>;
    fn write_config_file(&self, name: &str, bytes: &[u8]) -> Result<()>;
    fn state_file_exists(&self, name: &str) -> Result<bool>;
    /// Delete a state file. A file that is already gone is not an error.
    fn delete_state_file(&self, name: &str) -> Result<()>;
}

/// Delete a state file only if it exists, logging the deletion
pub fn delete_state_file_if_exists(store: &dyn StateStore, name: &str) -> Result<bool> {
    if !store.state_file_exists(name)? {
        return Ok(false);
    }
    tracing::info!(file = name, "Deleting state file");
    store.delete_state_file(name)?;
    Ok(true)
}

/// Filesystem-backed store
#[derive(Debug, Clone)]
pub struct FileManager {
    config_dir: PathBuf,
    state_dir: PathBuf,
}

impl FileManager {
    pub fn new(config_dir: impl Into<PathBuf>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            state_dir: state_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}

fn file_error(path: &Path, source: std::io::Error) -> Error {
    Error::File {
        file: path.display().to_string(),
        source,
    }
}

impl StateStore for FileManager {
    fn config_file_exists(&self, name: &str) -> Result<bool> {
        let path = self.config_dir.join(name);
        path.try_exists().map_err(|e| file_error(&path, e))
    }

    fn read_config_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.config_dir.join(name);
        std::fs::read(&path).map_err(|e| file_error(&path, e))
    }

    fn write_config_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir).map_err(|e| file_error(&self.config_dir, e))?;
        let path = self.config_dir.join(name);
        std::fs::write(&path, bytes).map_err(|e| file_error(&path, e))
    }

    fn state_file_exists(&self, name: &str) -> Result<bool> {
        let path = self.state_dir.join(name);
        path.try_exists().map_err(|e| file_error(&path, e))
    }

    fn delete_state_file(&self, name: &str) -> Result<()> {
        let path = self.state_dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(file_error(&path, e)),
        }
    }
}

#[derive(Default)]
struct MemFiles {
    config: HashMap<String, Vec<u8>>,
    state: HashMap<String, Vec<u8>>,
    read_only_config: HashSet<String>,
    undeletable_state: HashSet<String>,
}

/// In-memory store
#[derive(Default)]
pub struct MemFileManager {
    files: Mutex<MemFiles>,
}

impl MemFileManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemFiles> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put_config_file(&self, name: &str, bytes: &[u8]) {
        self.lock().config.insert(name.to_string(), bytes.to_vec());
    }

    pub fn put_state_file(&self, name: &str, bytes: &[u8]) {
        self.lock().state.insert(name.to_string(), bytes.to_vec());
    }

    pub fn config_file(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().config.get(name).cloned()
    }

    pub fn has_state_file(&self, name: &str) -> bool {
        self.lock().state.contains_key(name)
    }

    /// Names of all config files, sorted
    pub fn config_files(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().config.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of all state files, sorted
    pub fn state_files(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().state.keys().cloned().collect();
        names.sort();
        names
    }

    /// Make writes to a config file fail with `PermissionDenied`
    pub fn make_config_read_only(&self, name: &str) {
        self.lock().read_only_config.insert(name.to_string());
    }

    /// Make deletes of an existing state file fail with `PermissionDenied`
    pub fn make_state_undeletable(&self, name: &str) {
        self.lock().undeletable_state.insert(name.to_string());
    }
}

fn not_found(name: &str) -> Error {
    Error::File {
        file: name.to_string(),
        source: std::io::Error::from(ErrorKind::NotFound),
    }
}

impl StateStore for MemFileManager {
    fn config_file_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().config.contains_key(name))
    }

    fn read_config_file(&self, name: &str) -> Result<Vec<u8>> {
        self.lock().config.get(name).cloned().ok_or_else(|| not_found(name))
    }

    fn write_config_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let mut files = self.lock();
        if files.read_only_config.contains(name) {
            return Err(Error::File {
                file: name.to_string(),
                source: std::io::Error::from(ErrorKind::PermissionDenied),
            });
        }
        files.config.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn state_file_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().state.contains_key(name))
    }

    fn delete_state_file(&self, name: &str) -> Result<()> {
        let mut files = self.lock();
        if files.state.contains_key(name) && files.undeletable_state.contains(name) {
            return Err(Error::File {
                file: name.to_string(),
                source: std::io::Error::from(ErrorKind::PermissionDenied),
            });
        }
        files.state.remove(name);
        Ok(())
    }
}
