//! # Core Protocol Components
//!
//! Byte buffers and the binary codec that every I/O path goes through.
//!
//! ## Components
//! - **Buffer**: segmented, growable byte stream with zero-copy segment adoption
//! - **Codec**: big-endian fixed-width values, VarInt/VarLong, strings, arrays,
//!   UUIDs, packed positions and quantized angles
//! - **Counter**: write-only size measurement for two-pass serialization
//! - **Scratch**: context-owned staging region for buffer-to-buffer copies
//!
//! ## Safety Limits
//! - Strings are bounded to 65536 bytes unless the caller says otherwise
//! - Lengths are checked against readable bytes before any allocation

pub mod buffer;
pub mod codec;
pub mod counter;
pub mod scratch;
