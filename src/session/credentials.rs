use crate::error::StoreError;
use crate::session::store::KeyValueStore;
use tracing::debug;

/// Mirrors the API key into durable storage while "remember" is enabled.
///
/// This is a direct mirror, not a cache: every edit is written through and
/// disabling "remember" deletes the stored value at once.
pub struct ApiKeyMirror {
    store: Box<dyn KeyValueStore>,
    storage_key: String,
}

impl ApiKeyMirror {
    pub fn new(store: Box<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
        }
    }

    /// Raw stored value, including an empty string if one was written.
    pub fn stored(&self) -> Result<Option<String>, StoreError> {
        self.store.get(&self.storage_key)
    }

    /// Key to start the session with. An empty stored value counts as absent.
    pub fn restore(&self) -> Result<Option<String>, StoreError> {
        Ok(self.stored()?.filter(|key| !key.is_empty()))
    }

    pub fn key_edited(&mut self, key: &str, remember: bool) -> Result<(), StoreError> {
        if !remember {
            return Ok(());
        }
        debug!(target: "scenechat", "mirroring api key edit (len={})", key.len());
        self.store.set(&self.storage_key, key)
    }

    pub fn remember_toggled(&mut self, remember: bool, key: &str) -> Result<(), StoreError> {
        if !remember {
            debug!(target: "scenechat", "remember disabled, removing stored api key");
            return self.store.remove(&self.storage_key);
        }
        if key.is_empty() {
            return Ok(());
        }
        self.store.set(&self.storage_key, key)
    }
}

#[cfg(test)]
mod tests {
    use super::ApiKeyMirror;
    use crate::session::store::{FileStore, MemoryStore};

    const KEY: &str = "scenechat.api_key";

    #[test]
    fn restore_reads_previously_stored_key() {
        let mirror = ApiKeyMirror::new(Box::new(MemoryStore::new().with_entry(KEY, "AIza-1")), KEY);
        assert_eq!(mirror.restore().expect("restore").as_deref(), Some("AIza-1"));
    }

    #[test]
    fn restore_treats_empty_value_as_absent() {
        let mirror = ApiKeyMirror::new(Box::new(MemoryStore::new().with_entry(KEY, "")), KEY);
        assert_eq!(mirror.restore().expect("restore"), None);
    }

    #[test]
    fn edits_are_written_only_while_remember_is_on() {
        let mut mirror = ApiKeyMirror::new(Box::new(MemoryStore::new()), KEY);

        mirror.key_edited("AIza-1", false).expect("edit");
        assert_eq!(mirror.stored().expect("stored"), None);

        mirror.key_edited("AIza-2", true).expect("edit");
        assert_eq!(mirror.stored().expect("stored").as_deref(), Some("AIza-2"));
    }

    #[test]
    fn disabling_remember_deletes_then_enabling_writes_back() {
        let mut mirror = ApiKeyMirror::new(Box::new(MemoryStore::new().with_entry(KEY, "old")), KEY);

        mirror.remember_toggled(false, "old").expect("toggle off");
        assert_eq!(mirror.stored().expect("stored"), None);

        mirror.key_edited("typed-while-off", false).expect("edit");
        assert_eq!(mirror.stored().expect("stored"), None);

        mirror.remember_toggled(true, "typed-while-off").expect("toggle on");
        assert_eq!(mirror.stored().expect("stored").as_deref(), Some("typed-while-off"));
    }

    #[test]
    fn enabling_remember_with_empty_key_writes_nothing() {
        let mut mirror = ApiKeyMirror::new(Box::new(MemoryStore::new()), KEY);
        mirror.remember_toggled(true, "").expect("toggle on");
        assert_eq!(mirror.stored().expect("stored"), None);
    }

    #[test]
    fn file_backed_mirror_survives_restart() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("storage.json");

        let mut first = ApiKeyMirror::new(Box::new(FileStore::new(&path)), KEY);
        first.key_edited("AIza-persisted", true).expect("edit");

        let second = ApiKeyMirror::new(Box::new(FileStore::new(&path)), KEY);
        assert_eq!(second.restore().expect("restore").as_deref(), Some("AIza-persisted"));
    }
}
