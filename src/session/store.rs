use crate::error::StoreError;
use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Flat string-keyed durable storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Persists all entries as one JSON object in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, bytes).map_err(write_err)?;
        match fs::rename(&tmp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if self.path.exists() {
                    fs::remove_file(&self.path).map_err(write_err)?;
                    fs::rename(&tmp_path, &self.path).map_err(write_err)
                } else {
                    Err(write_err(rename_err))
                }
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStore, KeyValueStore};
    use crate::error::StoreError;
    use std::fs;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = FileStore::new(dir.path().join("storage.json"));
        assert_eq!(store.get("scenechat.api_key").expect("get should succeed"), None);
    }

    #[test]
    fn set_then_get_survives_a_new_handle() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::new(&path);
        store.set("scenechat.api_key", "AIza-test").expect("set should succeed");
        store.set("other", "value").expect("set should succeed");

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("scenechat.api_key").expect("get should succeed").as_deref(),
            Some("AIza-test")
        );
        assert_eq!(reopened.get("other").expect("get should succeed").as_deref(), Some("value"));
        assert!(!dir.path().join("nested").join("storage.json.tmp").exists());
    }

    #[test]
    fn remove_only_drops_the_named_key() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = FileStore::new(dir.path().join("storage.json"));
        store.set("a", "1").expect("set should succeed");
        store.set("b", "2").expect("set should succeed");

        store.remove("a").expect("remove should succeed");
        store.remove("never-set").expect("removing a missing key is fine");

        assert_eq!(store.get("a").expect("get should succeed"), None);
        assert_eq!(store.get("b").expect("get should succeed").as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_is_reported_as_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").expect("fixture should write");

        let store = FileStore::new(&path);
        let err = store.get("a").expect_err("corrupt storage should fail");
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.to_string().contains("storage.json"));
    }
}
