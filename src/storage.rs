use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    io::Write,
    path::PathBuf,
    rc::Rc,
};

use log::{debug, error, info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::{Note, NotepadError, Result, UserProfile};

/// Storage key holding the JSON array of notes.
pub const NOTES_KEY: &str = "notepad_pro_notes";

/// Storage key holding the JSON profile object.
pub const PROFILE_KEY: &str = "notepad_pro_profile";

/// A durable string key-value store supplied by the platform.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Key-value store keeping one `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("No stored value for {} at {}", key, path.display());
            return Ok(None);
        }

        let value = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            NotepadError::Io(e)
        })?;
        trace!("Read {} bytes for {}", value.len(), key);
        Ok(Some(value))
    }

    /// Writes through a temporary file in the same directory and renames it
    /// over the target, so a crash never leaves a half-written value.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            debug!("Creating data directory: {}", self.dir.display());
            fs::create_dir_all(&self.dir)?;
        }

        let path = self.path_for(key);
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NotepadError::Io(e)
        })?;

        temp_file.write_all(value.as_bytes())?;
        temp_file.flush()?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            NotepadError::Io(e.error)
        })?;

        trace!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, String>,
    fail_writes: bool,
}

/// In-memory key-value store. Clones share the same contents, so a test can
/// keep a handle after giving one to a `NoteStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `set` fail, as a full storage quota would.
    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Writes a raw value, bypassing the failure switch.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.borrow().values.get(key).cloned()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(NotepadError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "storage quota exceeded",
            )));
        }
        state.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persistence adapter reading and writing the notes and profile records.
///
/// It knows the two top-level shapes and nothing about note semantics.
pub struct NoteStorage<K: KeyValueStore> {
    backend: K,
    pretty: bool,
}

impl<K: KeyValueStore> NoteStorage<K> {
    pub fn new(backend: K) -> Self {
        Self {
            backend,
            pretty: false,
        }
    }

    /// Pretty-print persisted JSON.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Reads the notes record. `Ok(None)` means the key is absent.
    pub fn load_notes(&self) -> Result<Option<Vec<Note>>> {
        self.read_record(NOTES_KEY)
    }

    /// Reads the profile record. `Ok(None)` means the key is absent.
    pub fn load_profile(&self) -> Result<Option<UserProfile>> {
        self.read_record(PROFILE_KEY)
    }

    /// Writes the whole notes collection.
    pub fn save_notes(&mut self, notes: &[Note]) -> Result<()> {
        info!("Persisting {} notes", notes.len());
        self.write_record(NOTES_KEY, notes)
    }

    /// Writes the whole profile.
    pub fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        info!("Persisting profile");
        self.write_record(PROFILE_KEY, profile)
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.backend.get(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| NotepadError::ParseFailure {
                message: format!("{} is not valid JSON: {}", key, e),
            })?;

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| NotepadError::InvalidFormat {
                message: format!("{} has an unexpected shape: {}", key, e),
            })
    }

    fn write_record<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        self.backend.set(key, &json).map_err(|e| {
            warn!("Durable store rejected write of {}: {}", key, e);
            NotepadError::PersistenceWriteFailure {
                key: key.to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_load_as_none() {
        let storage = NoteStorage::new(MemoryKeyValueStore::new());
        assert!(storage.load_notes().unwrap().is_none());
        assert!(storage.load_profile().unwrap().is_none());
    }

    #[test]
    fn garbage_is_a_parse_failure() {
        let kv = MemoryKeyValueStore::new();
        kv.insert_raw(NOTES_KEY, "{not json");
        let storage = NoteStorage::new(kv);
        assert!(matches!(
            storage.load_notes(),
            Err(NotepadError::ParseFailure { .. })
        ));
    }

    #[test]
    fn wrong_shape_is_invalid_format() {
        let kv = MemoryKeyValueStore::new();
        kv.insert_raw(NOTES_KEY, r#"{"id":"x"}"#);
        kv.insert_raw(PROFILE_KEY, "[1,2]");
        let storage = NoteStorage::new(kv);
        assert!(matches!(
            storage.load_notes(),
            Err(NotepadError::InvalidFormat { .. })
        ));
        assert!(matches!(
            storage.load_profile(),
            Err(NotepadError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn rejected_write_maps_to_persistence_failure() {
        let kv = MemoryKeyValueStore::new();
        kv.fail_writes(true);
        let mut storage = NoteStorage::new(kv.clone());
        let err = storage.save_profile(&UserProfile::default()).unwrap_err();
        assert!(matches!(
            err,
            NotepadError::PersistenceWriteFailure { ref key, .. } if key == PROFILE_KEY
        ));
        assert!(kv.raw(PROFILE_KEY).is_none());
    }

    #[test]
    fn file_store_writes_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut kv = FileKeyValueStore::new(dir.path().join("data"));
        assert_eq!(kv.get(NOTES_KEY).unwrap(), None);

        kv.set(NOTES_KEY, "[]").unwrap();
        kv.set(NOTES_KEY, "[1]").unwrap();

        assert_eq!(kv.get(NOTES_KEY).unwrap().as_deref(), Some("[1]"));
        assert!(dir.path().join("data").join("notepad_pro_notes.json").exists());
    }
}
