use crate::common::errors::EnvError;

/// Origin-scoped key/value store that survives across sessions
/// (`localStorage` in a browser).
pub trait DurableStore {
    fn get(&self, key: &str) -> Result<Option<String>, EnvError>;
    fn set(&self, key: &str, value: &str) -> Result<(), EnvError>;
    fn remove(&self, key: &str) -> Result<(), EnvError>;

    /// Snapshot of every key currently stored
    fn keys(&self) -> Result<Vec<String>, EnvError>;
}

/// Key/value store scoped to the current browsing session
/// (`sessionStorage` in a browser). Only wholesale clearing is needed.
pub trait SessionStore {
    /// Remove every entry, returning how many there were
    fn clear(&self) -> Result<usize, EnvError>;
}
