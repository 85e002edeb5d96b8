use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use crate::common::errors::EnvError;
use crate::env::{DurableStore, SessionStore};

/// In-memory key/value store. Serves as both the durable and the session
/// store; operations named in `fail` return errors, to simulate quota or
/// security exceptions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    failing: RefCell<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store.entries.borrow_mut().extend(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into())),
        );
        store
    }

    /// Make an operation (`get`, `set`, `remove`, `keys`, `clear`) fail from now on
    pub fn fail(&self, operation: &'static str) {
        self.failing.borrow_mut().insert(operation);
    }

    pub fn heal(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }

    fn check(&self, operation: &'static str) -> Result<(), EnvError> {
        if self.failing.borrow().contains(operation) {
            Err(EnvError::new(format!("storage.{}", operation), "SecurityError"))
        } else {
            Ok(())
        }
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, EnvError> {
        self.check("get")?;
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), EnvError> {
        self.check("set")?;
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), EnvError> {
        self.check("remove")?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, EnvError> {
        self.check("keys")?;
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}

impl SessionStore for MemoryStore {
    fn clear(&self) -> Result<usize, EnvError> {
        self.check("clear")?;
        let mut entries = self.entries.borrow_mut();
        let count = entries.len();
        entries.clear();
        Ok(count)
    }
}
