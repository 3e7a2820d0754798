//! # Connection Acceptor
//!
//! Single-threaded accept loop over an edge-triggered [`Multiplexer`].
//!
//! ## Loop
//! 1. **Waiting**: block on the multiplexer (interrupted waits are retried)
//! 2. **Draining**: for each readiness event, accept until `WouldBlock`,
//!    handing each stream synchronously to the [`ConnectionHandler`]
//! 3. **Failed**: any multiplexer error, error/hang-up flag or accept error
//!    other than `WouldBlock` closes the listener and the multiplexer once,
//!    then surfaces the error. There is no retry.
//!
//! ```rust,no_run
//! use shipnet::config::ListenerConfig;
//! use shipnet::transport::acceptor::Acceptor;
//! use std::net::TcpStream;
//!
//! let mut acceptor = Acceptor::bind(&ListenerConfig::default(), |stream: TcpStream| {
//!     drop(stream);
//! })?;
//! acceptor.run()?;
//! # Ok::<(), shipnet::error::ProtocolError>(())
//! ```

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace};

use crate::config::ListenerConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::transport::multiplexer::{EdgeMultiplexer, Multiplexer, Readiness, ShutdownHandle};
use crate::utils::metrics::AcceptorMetrics;

/// Receives every accepted connection.
pub trait ConnectionHandler<S = TcpStream> {
    fn on_accept(&mut self, stream: S);
}

impl<S, F> ConnectionHandler<S> for F
where
    F: FnMut(S),
{
    fn on_accept(&mut self, stream: S) {
        self(stream)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptorState {
    Waiting,
    Draining,
    Failed,
}

pub struct Acceptor<M: Multiplexer, H> {
    multiplexer: M,
    handler: H,
    state: AcceptorState,
    timeout: Option<Duration>,
    ready: Vec<Readiness>,
    metrics: Arc<AcceptorMetrics>,
}

impl<H> Acceptor<EdgeMultiplexer, H>
where
    H: ConnectionHandler<TcpStream>,
{
    /// Bind the configured address and build an acceptor around it.
    pub fn bind(config: &ListenerConfig, handler: H) -> Result<Self> {
        let addr: SocketAddr = config.address.parse().map_err(|_| {
            ProtocolError::InvalidInput(format!("Invalid listen address: {}", config.address))
        })?;
        let multiplexer = EdgeMultiplexer::bind(addr, config.max_events)?;
        Ok(Self::new(multiplexer, handler, config.wait_timeout))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.multiplexer.local_addr()
    }

    /// Handle that makes [`run`](Acceptor::run) return from another thread.
    /// The loop fails with `NotConnected` and closes the listener once.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.multiplexer.shutdown_handle()
    }
}

impl<M, H> Acceptor<M, H>
where
    M: Multiplexer,
    H: ConnectionHandler<M::Stream>,
{
    pub fn new(multiplexer: M, handler: H, timeout: Option<Duration>) -> Self {
        Self {
            multiplexer,
            handler,
            state: AcceptorState::Waiting,
            timeout,
            ready: Vec::new(),
            metrics: Arc::new(AcceptorMetrics::new()),
        }
    }

    pub fn state(&self) -> AcceptorState {
        self.state
    }

    pub fn multiplexer(&self) -> &M {
        &self.multiplexer
    }

    pub fn metrics(&self) -> &Arc<AcceptorMetrics> {
        &self.metrics
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Run until a fatal error or a shutdown request. Only returns on failure.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.poll_once()?;
        }
    }

    /// One wait followed by a full drain of every reported event.
    ///
    /// Returns the number of connections handed off. A wait that times out
    /// returns `Ok(0)`.
    pub fn poll_once(&mut self) -> Result<usize> {
        if self.state == AcceptorState::Failed {
            return Err(ProtocolError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                constants::ERR_LISTENER_CLOSED,
            )));
        }

        self.state = AcceptorState::Waiting;
        loop {
            match self.multiplexer.wait(self.timeout, &mut self.ready) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.metrics.interrupted_wait();
                    trace!("Readiness wait interrupted, retrying");
                }
                Err(e) => return Err(self.fail(e)),
            }
        }

        if self.ready.is_empty() {
            return Ok(0);
        }
        self.metrics.wakeup();
        self.state = AcceptorState::Draining;

        let mut accepted = 0;
        for index in 0..self.ready.len() {
            let readiness = self.ready[index];
            if readiness.is_fault() {
                self.metrics.readiness_fault();
                let err = io::Error::other(format!(
                    "{} (readable: {}, error: {}, hangup: {})",
                    constants::ERR_READINESS_FAULT,
                    readiness.readable,
                    readiness.error,
                    readiness.hangup
                ));
                return Err(self.fail(err));
            }
            accepted += self.drain()?;
        }

        trace!(accepted, "Drained pending connections");
        self.state = AcceptorState::Waiting;
        Ok(accepted)
    }

    fn drain(&mut self) -> Result<usize> {
        let mut accepted = 0;
        loop {
            match self.multiplexer.accept() {
                Ok(stream) => {
                    self.metrics.connection_accepted();
                    self.handler.on_accept(stream);
                    accepted += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(accepted),
                Err(e) => {
                    self.metrics.accept_error();
                    return Err(self.fail(e));
                }
            }
        }
    }

    /// Enter `Failed`, releasing the listener and multiplexer exactly once.
    fn fail(&mut self, err: io::Error) -> ProtocolError {
        if self.state != AcceptorState::Failed {
            error!(error = %err, "Acceptor failed, closing listener");
            self.state = AcceptorState::Failed;
            self.multiplexer.close();
            self.metrics.log_metrics();
        }
        ProtocolError::Io(err)
    }
}

impl<M: Multiplexer, H> Drop for Acceptor<M, H> {
    fn drop(&mut self) {
        if self.state != AcceptorState::Failed {
            debug!("Acceptor dropped, closing listener");
            self.multiplexer.close();
        }
    }
}
