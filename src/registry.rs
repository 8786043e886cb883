//! Registry Module
//!
//! Maps database handle names to open engines; this is the surface the
//! shell and the network front end call into.
//!
//! A handle name is a plain file name resolved inside `Config::data_dir`.
//! Every operation other than `open` fails with `EngineNotOpen` until the
//! handle has been opened, and again after it is closed.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::engine::{CompactionStats, Engine};
use crate::error::{HashLogError, Result};
use crate::protocol::Command;

/// Open databases by handle name
pub struct Registry {
    config: Config,
    engines: RwLock<HashMap<String, Arc<Engine>>>,
    /// Serializes opens so the map lock is not held across a full log scan
    open_lock: Mutex<()>,
}

impl Registry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            engines: RwLock::new(HashMap::new()),
            open_lock: Mutex::new(()),
        }
    }

    /// Open (or create) the database `name`; opening an open handle is a no-op
    pub fn open(&self, name: &str) -> Result<()> {
        validate_handle(name)?;

        let _open_guard = self.open_lock.lock();
        if self.is_open(name) {
            tracing::debug!(handle = name, "database already open");
            return Ok(());
        }

        fs::create_dir_all(&self.config.data_dir).map_err(|source| HashLogError::OpenFile {
            path: self.config.data_dir.clone(),
            source,
        })?;

        // Other handles stay usable while this log is scanned
        let engine = Engine::open(self.config.data_dir.join(name), self.config.clone())?;
        self.engines.write().insert(name.to_string(), Arc::new(engine));
        Ok(())
    }

    pub fn get(&self, name: &str, key: &[u8]) -> Result<Vec<u8>> {
        self.engine(name)?.get(key)
    }

    pub fn set(&self, name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.engine(name)?.set(key, value)
    }

    pub fn delete(&self, name: &str, key: &[u8]) -> Result<()> {
        self.engine(name)?.delete(key)
    }

    pub fn compact(&self, name: &str) -> Result<CompactionStats> {
        self.engine(name)?.compact()
    }

    /// Release the database `name`
    ///
    /// Operations already holding the engine finish first; the file handles
    /// close when the last of them drops it.
    pub fn close(&self, name: &str) -> Result<()> {
        let engine = self
            .engines
            .write()
            .remove(name)
            .ok_or_else(|| HashLogError::EngineNotOpen(name.to_string()))?;

        match Arc::try_unwrap(engine) {
            Ok(engine) => engine.close(),
            Err(shared) => shared.sync(),
        }
    }

    /// Close every open database
    pub fn close_all(&self) -> Result<()> {
        for name in self.open_handles() {
            self.close(&name)?;
        }
        Ok(())
    }

    /// Shared handle to an open engine
    pub fn engine(&self, name: &str) -> Result<Arc<Engine>> {
        self.engines
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| HashLogError::EngineNotOpen(name.to_string()))
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.engines.read().contains_key(name)
    }

    /// Names of all open databases, sorted
    pub fn open_handles(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation
    pub fn execute(&self, command: Command) -> Result<Option<Vec<u8>>> {
        match command {
            Command::Open { db } => {
                self.open(&db)?;
                Ok(None)
            }
            Command::Get { db, key } => self.get(&db, &key).map(Some),
            Command::Set { db, key, value } => {
                self.set(&db, &key, &value)?;
                Ok(None)
            }
            Command::Delete { db, key } => {
                self.delete(&db, &key)?;
                Ok(None)
            }
            Command::Compact { db } => {
                let stats = self.compact(&db)?;
                Ok(Some(
                    format!(
                        "{} keys, {} -> {} bytes",
                        stats.live_keys, stats.bytes_before, stats.bytes_after
                    )
                    .into_bytes(),
                ))
            }
            Command::Close { db } => {
                self.close(&db)?;
                Ok(None)
            }
            Command::Ping => Ok(Some(b"PONG".to_vec())),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            tracing::warn!("failed to close databases: {}", e);
        }
    }
}

/// Handle names must stay inside the data directory
fn validate_handle(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0')
        || name.ends_with(&format!(".{}", Engine::COMPACT_SUFFIX));
    if bad {
        return Err(HashLogError::InvalidHandle(name.to_string()));
    }
    Ok(())
}
