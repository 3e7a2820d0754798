//! # shipnet
//!
//! Network protocol runtime for game servers: a segmented byte buffer, the
//! binary wire codec built on it, a protocol version registry, a packet
//! dispatch table and an edge-triggered connection acceptor.
//!
//! ## Layout
//! - [`core`]: [`SegmentedBuffer`](core::buffer::SegmentedBuffer), the
//!   [`WireWrite`](core::codec::WireWrite)/[`WireRead`](core::codec::WireRead)
//!   codec traits and the [`SizeCounter`](core::counter::SizeCounter)
//! - [`protocol`]: [`ProtocolVersions`](protocol::version::ProtocolVersions)
//!   and [`DispatchTable`](protocol::dispatcher::DispatchTable)
//! - [`transport`]: [`Acceptor`](transport::acceptor::Acceptor) over a
//!   [`Multiplexer`](transport::multiplexer::Multiplexer)
//! - [`config`], [`error`], [`utils`]: configuration, error types, logging and metrics
//!
//! ## Quick Start
//! ```rust
//! use shipnet::core::buffer::SegmentedBuffer;
//! use shipnet::core::codec::{WireRead, WireWrite};
//!
//! let mut buffer = SegmentedBuffer::new(16);
//! buffer.write_var_int(300);
//! buffer.write_string("hello");
//!
//! assert_eq!(buffer.read_var_int()?, 300);
//! assert_eq!(buffer.read_string()?, "hello");
//! # Ok::<(), shipnet::error::ProtocolError>(())
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::config::NetworkConfig;
pub use crate::core::buffer::SegmentedBuffer;
pub use crate::core::codec::{Decode, Encode, WireRead, WireWrite};
pub use crate::core::counter::SizeCounter;
pub use crate::core::scratch::ScratchBuffer;
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::dispatcher::{DispatchTable, PacketHolder};
pub use crate::protocol::version::{ProtocolVersion, ProtocolVersions};
pub use crate::transport::acceptor::{Acceptor, ConnectionHandler};
