use super::error::{PrefResult, PreferenceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::debug;

/// Abstraction for key-value preference storage to enable testing without a real file
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStore: Send + Sync {
    /// Raw stored value, `None` when the key was never written
    fn get(&self, key: &str) -> PrefResult<Option<Value>>;

    /// Store a value, reporting whether the write was accepted
    fn set(&self, key: &str, value: Value) -> PrefResult<bool>;

    /// Remove a key, reporting whether the write was accepted
    fn remove(&self, key: &str) -> PrefResult<bool>;

    fn clear(&self) -> PrefResult<bool>;

    fn keys(&self) -> PrefResult<Vec<String>>;

    fn get_int(&self, key: &str) -> PrefResult<Option<i64>> {
        match self.get(key)? {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| PreferenceError::type_mismatch(key, "int", value_kind(&value))),
        }
    }

    fn set_int(&self, key: &str, value: i64) -> PrefResult<bool> {
        self.set(key, Value::from(value))
    }

    fn get_string(&self, key: &str) -> PrefResult<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(PreferenceError::type_mismatch(
                key,
                "string",
                value_kind(&other),
            )),
        }
    }

    fn set_string(&self, key: &str, value: &str) -> PrefResult<bool> {
        self.set(key, Value::from(value))
    }

    fn get_bool(&self, key: &str) -> PrefResult<Option<bool>> {
        match self.get(key)? {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(PreferenceError::type_mismatch(
                key,
                "bool",
                value_kind(&other),
            )),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> PrefResult<bool> {
        self.set(key, Value::from(value))
    }
}

/// Short type name of a JSON value, used in mismatch errors
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "double",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

/// Real preference store persisting to a JSON file.
///
/// The file is replaced by renaming a fully written sibling, so readers see
/// either the old or the new document.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    // Writers hold it across read-modify-write, readers share it
    file_lock: RwLock<()>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PrefResult<PreferencesFile> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PreferencesFile::default());
            }
            Err(e) => return Err(PreferenceError::io(&self.path, "read", e)),
        };

        if content.trim().is_empty() {
            return Ok(PreferencesFile::default());
        }
        serde_json::from_str(&content).map_err(|e| PreferenceError::corrupt(&self.path, e))
    }

    fn read_locked(&self) -> PrefResult<PreferencesFile> {
        let _guard = self.file_lock.read().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    fn save(&self, file: &PreferencesFile) -> PrefResult<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PreferenceError::io(parent, "create directory", e))?;
                parent
            }
            None => Path::new("."),
        };
        let json =
            serde_json::to_string_pretty(file).map_err(|e| PreferenceError::corrupt(&self.path, e))?;

        let mut staged = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| PreferenceError::io(dir, "create temporary file", e))?;
        staged
            .write_all(json.as_bytes())
            .map_err(|e| PreferenceError::io(&self.path, "write", e))?;
        staged
            .persist(&self.path)
            .map_err(|e| PreferenceError::io(&self.path, "replace", e.error))?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, Value>)) -> PrefResult<bool> {
        let _guard = self.file_lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load()?;
        f(&mut file.values);
        self.save(&file)?;
        Ok(true)
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> PrefResult<Option<Value>> {
        Ok(self.read_locked()?.values.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> PrefResult<bool> {
        debug!(key, path = %self.path.display(), "writing preference");
        self.modify(|values| {
            values.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> PrefResult<bool> {
        self.modify(|values| {
            values.remove(key);
        })
    }

    fn clear(&self) -> PrefResult<bool> {
        self.modify(BTreeMap::clear)
    }

    fn keys(&self) -> PrefResult<Vec<String>> {
        Ok(self.read_locked()?.values.into_keys().collect())
    }
}

/// In-memory preference store for tests and demo mode
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backing map before first use
    pub fn with_initial_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: Mutex::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Copy of the current state, read without going through the trait
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> PrefResult<Option<Value>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> PrefResult<bool> {
        self.lock().insert(key.to_string(), value);
        Ok(true)
    }

    fn remove(&self, key: &str) -> PrefResult<bool> {
        self.lock().remove(key);
        Ok(true)
    }

    fn clear(&self) -> PrefResult<bool> {
        self.lock().clear();
        Ok(true)
    }

    fn keys(&self) -> PrefResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}
