//! Key/value storage that outlives a session store instance.
//!
//! Plays the part of browser local storage: string values under string keys.
//! [`MemoryStorage`] forgets everything on drop, [`PersistentStorage`] keeps
//! entries in a fjall keyspace on disk.

use std::collections::HashMap;
use std::path::Path;

use fjall::Keyspace;

use crate::{EcoRideError, Result};

pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

pub struct PersistentStorage {
    store: Keyspace,
}

impl PersistentStorage {
    /// Open (or create) the storage database under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let db = fjall::Database::builder(path.as_ref()).open()?;
        let items = db.keyspace("session", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentStorage { store: items })
    }
}

impl SessionStorage for PersistentStorage {
    #[tracing::instrument(name = "query_storage", level = "debug", skip(self))]
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let Some(bytes) = self.store.get(key.as_bytes())? else {
            tracing::debug!("Key not found");
            return Ok(None);
        };
        let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
            EcoRideError::storage(format!("Stored value for '{key}' is not UTF-8: {e}"))
        })?;
        Ok(Some(value))
    }

    #[tracing::instrument(name = "put_storage", level = "debug", skip(self, value))]
    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.store
            .insert(key.as_bytes().to_vec(), value.as_bytes().to_vec())?;
        Ok(())
    }

    #[tracing::instrument(name = "remove_storage", level = "debug", skip(self))]
    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.store.remove(key.as_bytes().to_vec())?;
        Ok(())
    }
}
