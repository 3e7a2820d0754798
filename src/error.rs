//! # Error Types
//!
//! Error handling for the buffer, codec and transport layers.
//!
//! ## Error Categories
//! - **Buffer Errors**: reads or skips past the readable bytes
//! - **Codec Errors**: malformed or truncated VarInt/VarLong, oversized lengths
//! - **I/O Errors**: socket and multiplexer syscall failures
//! - **Configuration Errors**: unreadable or invalid configuration
//!
//! A missing dispatch registration is not an error; see
//! [`DispatchTable::dispatch`](crate::protocol::dispatcher::DispatchTable::dispatch).
//!
//! ## Example Usage
//! ```rust
//! use shipnet::core::buffer::SegmentedBuffer;
//! use shipnet::core::codec::WireRead;
//! use shipnet::error::ProtocolError;
//!
//! let mut buffer = SegmentedBuffer::new(64);
//! match buffer.read_int() {
//!     Err(ProtocolError::BufferUnderflow { requested, available }) => {
//!         assert_eq!((requested, available), (4, 0));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    pub const ERR_STRING_TOO_LONG: &str = "Invalid received string size";
    pub const ERR_ARRAY_TOO_LONG: &str = "Invalid received byte array size";
    pub const ERR_STRING_NOT_UTF8: &str = "Received string is not valid UTF-8";
    pub const ERR_EMPTY_VERSION_LIST: &str = "Protocol version list cannot be empty";
    pub const ERR_LISTENER_CLOSED: &str = "Listening socket is closed";
    pub const ERR_LISTENER_SHUTDOWN: &str = "Listener shutdown requested";
    pub const ERR_READINESS_FAULT: &str = "Listening socket reported error or hangup";
}

/// Primary error type for all buffer, codec and transport operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Buffer underflow: requested {requested} bytes, {available} readable")]
    BufferUnderflow { requested: usize, available: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid VarInt: continuation bit set after 5 bytes")]
    InvalidVarInt,

    #[error("Invalid VarLong: continuation bit set after 10 bytes")]
    InvalidVarLong,

    #[error("Buffer doesn't contain enough data to read VarInt")]
    IncompleteVarInt,

    #[error("Buffer doesn't contain enough data to read VarLong")]
    IncompleteVarLong,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// True for errors caused by a truncated transport rather than malformed data.
    ///
    /// Callers reading from a partially received stream can wait for more bytes
    /// and retry the decode when this returns `true`.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            ProtocolError::BufferUnderflow { .. }
                | ProtocolError::IncompleteVarInt
                | ProtocolError::IncompleteVarLong
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_classification() {
        assert!(ProtocolError::IncompleteVarInt.is_incomplete());
        assert!(ProtocolError::BufferUnderflow {
            requested: 2,
            available: 1
        }
        .is_incomplete());
        assert!(!ProtocolError::InvalidVarInt.is_incomplete());
        assert!(!ProtocolError::InvalidInput("x".into()).is_incomplete());
    }

    #[test]
    fn test_io_error_keeps_os_text() {
        let err: ProtocolError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(err.to_string(), "I/O error: boom");
    }
}
