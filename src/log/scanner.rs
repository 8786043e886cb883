//! Marker resynchronization
//!
//! Finds the next record marker in a byte stream using a bounded sliding
//! window, so a scan never buffers more than one block plus the tail of the
//! previous one.

use std::io::{ErrorKind, Read};

use crate::error::{HashLogError, Result};

use super::record::{MARKER_BYTES, MARKER_SIZE};

/// Sliding-window search for the record marker
#[derive(Debug, Clone, Copy)]
pub struct MarkerScanner {
    block_size: usize,
}

impl MarkerScanner {
    /// Create a scanner reading `block_size` bytes at a time
    ///
    /// Block sizes below the marker size are raised to the marker size.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(MARKER_SIZE),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Advance through `reader` until the marker is found
    ///
    /// `start` is the absolute offset the reader is positioned at. Returns
    /// the absolute offset of the byte immediately after the marker. The
    /// reader itself ends up somewhere past that point (up to one block);
    /// callers seek to the returned offset before decoding.
    ///
    /// End of stream without a match is `IndicatorNotFound`.
    pub fn find_next<R: Read>(&self, reader: &mut R, start: u64) -> Result<u64> {
        let keep = MARKER_SIZE - 1;
        let mut block = vec![0u8; self.block_size];
        let mut window: Vec<u8> = Vec::with_capacity(self.block_size + keep);
        // absolute offset of window[0]
        let mut window_start = start;

        loop {
            let n = match reader.read(&mut block) {
                Ok(0) => {
                    return Err(HashLogError::IndicatorNotFound {
                        offset: window_start + window.len() as u64,
                    })
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashLogError::Read(e)),
            };

            window.extend_from_slice(&block[..n]);

            if let Some(pos) = window
                .windows(MARKER_SIZE)
                .position(|candidate| candidate == MARKER_BYTES)
            {
                return Ok(window_start + (pos + MARKER_SIZE) as u64);
            }

            // Retain the last MARKER_SIZE - 1 bytes for a match across the boundary
            let consumed = window.len().saturating_sub(keep);
            window.drain(..consumed);
            window_start += consumed as u64;
        }
    }
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new(MARKER_SIZE * 1024)
    }
}
