use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("Failed to write cache file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize cache: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted scalar key-value substrate. Absence of a key is a normal state.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
}

/// In-memory substrate for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Substrate persisted as a single JSON object file.
///
/// A missing file starts empty. A corrupt file also starts empty (with a
/// warning) and is overwritten on the next `set`.
pub struct JsonFileKv {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileKv {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = Self::load_from_file(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn load_from_file(path: &Path) -> BTreeMap<String, String> {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Discarding corrupt cache file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read cache file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        }
    }

    /// Write-to-temp-then-rename so a crash mid-write never leaves a truncated file.
    fn save_to_file(&self, values: &BTreeMap<String, String>) -> Result<(), KvError> {
        let json = serde_json::to_string_pretty(values)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_file = self.path.with_extension("json.tmp");
        fs::write(&temp_file, json)?;
        fs::rename(&temp_file, &self.path)?;
        Ok(())
    }
}

impl KvStore for JsonFileKv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Transactional: on write failure the in-memory value is rolled back.
    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut values = self.values.lock();
        let previous = values.insert(key.to_string(), value.to_string());

        if let Err(e) = self.save_to_file(&values) {
            match previous {
                Some(previous) => values.insert(key.to_string(), previous),
                None => values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
