//! # Transport Layer
//!
//! Listening-socket plumbing for the server side.
//!
//! ## Components
//! - **Multiplexer**: readiness abstraction plus the edge-triggered `mio`/`socket2` implementation
//! - **Acceptor**: accept loop that drains every pending connection per wake-up
//!
//! Everything here is synchronous and single-threaded; accepted streams are
//! non-blocking and handed off as soon as they are accepted.

pub mod acceptor;
pub mod multiplexer;

pub use acceptor::{Acceptor, AcceptorState, ConnectionHandler};
pub use multiplexer::{EdgeMultiplexer, Multiplexer, Readiness, ShutdownHandle};
