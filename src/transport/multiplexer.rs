//! # Readiness Multiplexing
//!
//! The [`Multiplexer`] trait is the seam between the accept loop and the OS.
//! [`EdgeMultiplexer`] is the production implementation: a `socket2`-built
//! listening socket watched by a `mio` poller, which is edge-triggered epoll
//! on Linux. A readiness notification therefore fires once per transition,
//! and the caller must accept until `WouldBlock` before waiting again.

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::constants;

const LISTENER: Token = Token(0);
const SHUTDOWN: Token = Token(1);

/// Readiness flags reported for the listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    pub readable: bool,
    pub error: bool,
    pub hangup: bool,
}

impl Readiness {
    pub const READABLE: Readiness = Readiness {
        readable: true,
        error: false,
        hangup: false,
    };

    /// True when the event must terminate the accept loop.
    pub fn is_fault(&self) -> bool {
        self.error || self.hangup || !self.readable
    }
}

/// A listening socket paired with a readiness poller.
pub trait Multiplexer {
    /// Accepted connection type handed to the connection handler
    type Stream;

    /// Block until the listener is ready or `timeout` elapses, replacing the
    /// contents of `ready`. `None` waits indefinitely.
    fn wait(&mut self, timeout: Option<Duration>, ready: &mut Vec<Readiness>) -> io::Result<()>;

    /// Accept one pending connection, `WouldBlock` when none remain.
    fn accept(&mut self) -> io::Result<Self::Stream>;

    /// Close the listening socket and the poller. Must be idempotent.
    fn close(&mut self);
}

/// Stops a running [`EdgeMultiplexer`] from another thread.
///
/// [`shutdown`](ShutdownHandle::shutdown) wakes the poller; the pending or
/// next `wait` then fails with `NotConnected`, which the acceptor treats as
/// fatal and closes the listener.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    waker: Arc<Waker>,
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) -> io::Result<()> {
        self.requested.store(true, Ordering::Release);
        self.waker.wake()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Edge-triggered listener backed by `mio` and `socket2`.
#[derive(Debug)]
pub struct EdgeMultiplexer {
    listener: Option<TcpListener>,
    poll: Option<Poll>,
    events: Events,
    shutdown: ShutdownHandle,
    local_addr: SocketAddr,
}

impl EdgeMultiplexer {
    /// Bind a non-blocking, close-on-exec listener at `addr` with the
    /// platform's maximum backlog and register it for read readiness.
    pub fn bind(addr: SocketAddr, max_events: usize) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(libc::SOMAXCONN)?;
        socket.set_nonblocking(true)?;
        let mut listener = TcpListener::from_std(socket.into());

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let shutdown = ShutdownHandle {
            waker: Arc::new(Waker::new(poll.registry(), SHUTDOWN)?),
            requested: Arc::new(AtomicBool::new(false)),
        };

        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, backlog = libc::SOMAXCONN, "Listening");

        Ok(Self {
            listener: Some(listener),
            poll: Some(poll),
            events: Events::with_capacity(max_events.max(1)),
            shutdown,
            local_addr,
        })
    }

    /// Bound address; useful when binding to port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.listener.is_none()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, constants::ERR_LISTENER_CLOSED)
}

fn shutdown_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, constants::ERR_LISTENER_SHUTDOWN)
}

impl Multiplexer for EdgeMultiplexer {
    type Stream = TcpStream;

    fn wait(&mut self, timeout: Option<Duration>, ready: &mut Vec<Readiness>) -> io::Result<()> {
        ready.clear();
        let poll = self.poll.as_mut().ok_or_else(closed_error)?;
        if self.shutdown.is_requested() {
            return Err(shutdown_error());
        }
        poll.poll(&mut self.events, timeout)?;
        if self.shutdown.is_requested() {
            return Err(shutdown_error());
        }

        ready.extend(
            self.events
                .iter()
                .filter(|event| event.token() == LISTENER)
                .map(|event| Readiness {
                    readable: event.is_readable(),
                    error: event.is_error(),
                    hangup: event.is_read_closed() || event.is_write_closed(),
                }),
        );
        Ok(())
    }

    fn accept(&mut self) -> io::Result<TcpStream> {
        let listener = self.listener.as_ref().ok_or_else(closed_error)?;
        // mio hands back non-blocking, close-on-exec streams
        let (stream, peer) = listener.accept()?;
        debug!(peer = %peer, "Accepted connection");
        Ok(TcpStream::from(stream))
    }

    fn close(&mut self) {
        let Some(mut listener) = self.listener.take() else {
            return;
        };

        if let Some(poll) = self.poll.take() {
            if let Err(e) = poll.registry().deregister(&mut listener) {
                warn!(error = %e, "Failed to deregister listener");
            }
        }
        drop(listener);
        info!(address = %self.local_addr, "Listener closed");
    }
}

impl Drop for EdgeMultiplexer {
    fn drop(&mut self) {
        self.close();
    }
}
