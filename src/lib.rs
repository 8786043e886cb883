//! # hashlog
//!
//! A single-file, append-only key-value store in the log-structured hash
//! style:
//! - Every write appends a marker-delimited, checksummed record
//! - A volatile in-memory index maps each key to its latest value's offset
//! - Recovery rescans the log, skipping damaged records by resynchronizing
//!   on the next marker
//! - Compaction rewrites the log with one record per live key
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────┐   ┌─────────────────────────────┐
//! │         TCP Server          │   │        Line Shell           │
//! │     (worker thread pool)    │   │   (local or over TCP)       │
//! └──────────────┬──────────────┘   └──────────────┬──────────────┘
//!                └────────────────┬────────────────┘
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Registry (handle name → Engine)               │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │            (Single Writer / Multi Reader per log)            │
//! └──────────────┬─────────────────────────────┬────────────────┘
//!                │                             │
//!                ▼                             ▼
//!         ┌─────────────┐               ┌─────────────┐
//!         │     Log     │               │  Key Index  │
//!         │  (Append +  │               │  (RwLock)   │
//!         │   Scanner)  │               └─────────────┘
//!         └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod checksum;
pub mod engine;
pub mod index;
pub mod log;
pub mod network;
pub mod protocol;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, SyncStrategy};
pub use engine::{CompactionStats, Engine};
pub use error::{HashLogError, Result};
pub use index::{KeyIndex, Location};
pub use registry::Registry;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hashlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
