//! Configuration for hashlog
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{HashLogError, Result};
use crate::log::MARKER_SIZE;

/// Main configuration for a hashlog instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory in which database handle names resolve to log files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── {handle}            (append-only log, one per database)
    ///     └── {handle}.compact    (only while a compaction is running)
    pub data_dir: PathBuf,

    /// Sync strategy: how often to fsync the log
    pub sync_strategy: SyncStrategy,

    /// Block size (bytes) read at a time while scanning for record markers
    pub scan_block_size: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max connections waiting for or being served by a worker
    pub max_connections: usize,

    /// Number of connection worker threads
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every appended record (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced records (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./hashlog_data"),
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            scan_block_size: MARKER_SIZE * 1024, // 8 KiB
            listen_addr: "127.0.0.1:7070".to_string(),
            max_connections: 1024,
            worker_threads: 8,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the settings that would otherwise fail deep inside a scan or
    /// the server loop
    pub fn validate(&self) -> Result<()> {
        if self.scan_block_size < MARKER_SIZE {
            return Err(HashLogError::Config(format!(
                "scan_block_size must be at least {} bytes, got {}",
                MARKER_SIZE, self.scan_block_size
            )));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(HashLogError::Config(
                "sync_strategy EveryNEntries needs count > 0".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(HashLogError::Config(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(HashLogError::Config(
                "worker_threads must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all log files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the marker scan block size (in bytes)
    pub fn scan_block_size(mut self, size: usize) -> Self {
        self.config.scan_block_size = size;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of queued or active connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the number of connection worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
