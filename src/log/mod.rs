//! Log Module
//!
//! The single append-only file that is the only durable state of a database.
//!
//! ## Responsibilities
//! - Encode key/value pairs into self-describing, marker-delimited records
//! - Append records strictly at end-of-file
//! - Sequentially scan the log, skipping damaged bytes by resynchronizing
//!   on the next marker
//! - Random-access value reads at indexed locations
//!
//! ## File Format
//! No file header; an empty file is an empty database.
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Record 1                                                        │
//! │ ┌──────────┬─────────┬──────────┬───────┬─────────┬──────────┐  │
//! │ │Marker (8)│KeyLen(1)│ValLen (8)│  Key  │  Value  │Cksum (8) │  │
//! │ └──────────┴─────────┴──────────┴───────┴─────────┴──────────┘  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ (garbage from a torn write is skipped up to the next marker)    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Record 2 ...                                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//! Integers are little-endian. The checksum covers key and value only.
//! `ValLen == 0` marks a tombstone.

mod reader;
mod record;
mod scanner;
mod writer;

pub use reader::{read_value, LogScanner, ScanStats};
pub use record::{
    decode_record, encode_record, encoded_len, LogRecord, HEADER_SIZE, LENGTHS_SIZE, MARKER,
    MARKER_BYTES, MARKER_SIZE, MAX_KEY_SIZE,
};
pub use scanner::MarkerScanner;
pub use writer::LogWriter;
