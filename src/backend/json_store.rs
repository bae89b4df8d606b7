use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::backend::interface::{BackendError, Result, Storage};

type Items = BTreeMap<String, String>;

/// Storage area kept in a single JSON object file, one string value per key.
/// A missing file reads as an empty area.
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>
}

impl JsonStore {
    pub fn new(path: impl AsRef<Path>) -> JsonStore {
        JsonStore { path: path.as_ref().to_owned(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> BackendError {
        BackendError::Io { path: self.path.clone(), source }
    }

    fn load(&self) -> Result<Items> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Items::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Items::new()),
            Err(err) => Err(self.io_error(err))
        }
    }

    fn store(&self, items: &Items) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let content = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut Items)) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| BackendError::Poisoned)?;
        let mut items = self.load()?;
        f(&mut items);
        self.store(&items)
    }
}

impl Storage for JsonStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| BackendError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|items| { items.insert(key.to_owned(), value.to_owned()); })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.modify(|items| { items.remove(key); })
    }

    fn clear(&self) -> Result<()> {
        self.modify(|items| items.clear())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().map_err(|_| BackendError::Poisoned)?;
        Ok(self.load()?.into_keys().collect())
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    use crate::backend::{BackendError, JsonStore, Storage};

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    fn missing_file_is_empty(dir: TempDir) {
        let store = JsonStore::new(dir.path().join("storage.json"));
        assert_eq!(store.get_item("atm.ledger").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[rstest]
    fn items_survive_reopening(dir: TempDir) {
        let path = dir.path().join("nested").join("storage.json");
        let store = JsonStore::new(&path);
        store.set_item("atm.display-mode", "\"dark\"").unwrap();
        store.set_item("atm.profile", "{}").unwrap();

        let reopened = JsonStore::new(&path);
        assert_eq!(reopened.get_item("atm.display-mode").unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(reopened.keys().unwrap(), vec!["atm.display-mode", "atm.profile"]);

        let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"atm.display-mode": "\"dark\"", "atm.profile": "{}"}));
    }

    #[rstest]
    fn remove_and_clear(dir: TempDir) {
        let store = JsonStore::new(dir.path().join("storage.json"));
        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();

        store.remove_item("a").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);
        assert_eq!(store.get_item("b").unwrap().as_deref(), Some("2"));

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[rstest]
    fn malformed_file_is_an_error(dir: TempDir) {
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();
        let store = JsonStore::new(&path);
        assert!(matches!(store.get_item("a"), Err(BackendError::Malformed(..))));
    }
}
