//! Reusable staging region for buffer-to-buffer copies.
//!
//! One [`ScratchBuffer`] belongs to one execution context (a worker thread, a
//! connection task) and is dropped with it. Copy paths borrow it mutably for
//! the duration of a single copy, so a nested copy through the same scratch
//! region is rejected by the borrow checker.

use crate::config::{BufferConfig, MAX_PACKET_SIZE};
use crate::error::{ProtocolError, Result};

#[derive(Debug)]
pub struct ScratchBuffer {
    region: Vec<u8>,
    limit: usize,
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new(MAX_PACKET_SIZE)
    }
}

impl ScratchBuffer {
    /// Create a scratch buffer that stages at most `limit` bytes per copy.
    ///
    /// Memory is allocated lazily and kept for reuse.
    pub fn new(limit: usize) -> Self {
        Self {
            region: Vec::new(),
            limit,
        }
    }

    /// Scratch region bounded by the configured `max_packet_size`.
    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(config.max_packet_size)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently allocated for staging
    pub fn allocated(&self) -> usize {
        self.region.len()
    }

    /// Fails with `InvalidInput` when a copy of `size` bytes would not fit.
    pub fn check_limit(&self, size: usize) -> Result<()> {
        if size > self.limit {
            return Err(ProtocolError::InvalidInput(format!(
                "copy of {size} bytes exceeds scratch limit of {} bytes",
                self.limit
            )));
        }
        Ok(())
    }

    /// Borrow a staging slice of exactly `size` bytes.
    pub fn region(&mut self, size: usize) -> Result<&mut [u8]> {
        self.check_limit(size)?;
        if self.region.len() < size {
            self.region.resize(size, 0);
        }
        Ok(&mut self.region[..size])
    }
}
