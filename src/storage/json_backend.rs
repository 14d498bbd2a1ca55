use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{debug, error, warn};

use super::KeyValueStore;
use crate::{config::Config, errors::StoreError};

const FILE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

type Result<T> = std::result::Result<T, StoreError>;

/// Filesystem-backed store keeping one pretty-printed JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Opens the store in the directory resolved from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.storage_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let name = canonical_key(key).ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        Ok(self.root.join(format!("{}.{}", name, FILE_EXTENSION)))
    }

    /// Reads `key`, distinguishing a missing file (`Ok(None)`) from a failure.
    pub fn try_get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if data.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Writes `value` atomically by staging to a temporary file first.
    pub fn try_save(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string_pretty(value)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        debug!(key, path = %path.display(), "persisted value");
        Ok(())
    }

    pub fn try_remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "unable to read stored value, treating as absent");
                None
            }
        }
    }

    fn save(&self, key: &str, value: &Value) {
        if let Err(err) = self.try_save(key, value) {
            error!(key, error = %err, "failed to persist value");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.try_remove(key) {
            error!(key, error = %err, "failed to remove stored value");
        }
    }
}

fn canonical_key(key: &str) -> Option<String> {
    let sanitized: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
