//! # Packet Dispatch
//!
//! Two-level ordinal table routing a decoded packet to the callback registered
//! for `(handler type, packet type)`.
//!
//! Registration needs `&mut self` and dispatch only `&self`, so the table is
//! filled during initialization and can then be shared (for example behind an
//! `Arc`) without any locking. A missing registration is ordinary control
//! flow: [`DispatchTable::dispatch`] returns `false`.

use std::any::Any;
use std::fmt;
use tracing::{debug, trace};

/// Outer dimension grows in steps of this many handler slots
pub const HANDLER_GROWTH: usize = 8;

/// A handler instance that knows its handler-type ordinal.
pub trait HandlerKind {
    fn handler_ordinal(&self) -> u32;
}

/// A decoded packet that knows its packet-type ordinal.
pub trait PacketKind {
    fn packet_ordinal(&self) -> u32;
}

/// Decoded packet with a type-erased payload.
pub struct PacketHolder {
    ordinal: u32,
    payload: Box<dyn Any + Send>,
}

impl PacketHolder {
    pub fn new<T: Any + Send>(ordinal: u32, payload: T) -> Self {
        Self {
            ordinal,
            payload: Box::new(payload),
        }
    }

    #[inline]
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Borrow the payload if it has type `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Take the payload back if it has type `T`; otherwise returns `self`.
    pub fn into_payload<T: Any>(self) -> Result<T, Self> {
        let ordinal = self.ordinal;
        self.payload
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|payload| Self { ordinal, payload })
    }
}

impl PacketKind for PacketHolder {
    fn packet_ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl fmt::Debug for PacketHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketHolder")
            .field("ordinal", &self.ordinal)
            .finish_non_exhaustive()
    }
}

type Callback<H, C, P> = dyn Fn(&mut H, &mut C, &P) -> bool + Send + Sync + 'static;

/// Callback table indexed by handler ordinal, then packet ordinal.
///
/// `H` is the handler type, `C` the per-connection context handed through
/// untouched, `P` the decoded packet type.
pub struct DispatchTable<H: ?Sized, C: ?Sized, P: ?Sized = PacketHolder> {
    callbacks: Vec<Vec<Option<Box<Callback<H, C, P>>>>>,
}

impl<H: ?Sized, C: ?Sized, P: ?Sized> Default for DispatchTable<H, C, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized, C: ?Sized, P: ?Sized> DispatchTable<H, C, P> {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Register `callback` for `(handler_ordinal, packet_ordinal)`, replacing
    /// any earlier registration.
    ///
    /// The handler dimension grows to `handler_ordinal + HANDLER_GROWTH` when
    /// too small; the packet dimension grows to exactly `packet_ordinal + 1`.
    ///
    /// Both dimensions are dense, so memory grows with the largest ordinal
    /// registered rather than with the number of callbacks. Ordinals are
    /// meant to be small enum indices: registering `u32::MAX` allocates
    /// billions of slots and will abort on allocation failure.
    pub fn register<F>(&mut self, handler_ordinal: u32, packet_ordinal: u32, callback: F)
    where
        F: Fn(&mut H, &mut C, &P) -> bool + Send + Sync + 'static,
    {
        let handler_index = handler_ordinal as usize;
        if handler_index >= self.callbacks.len() {
            self.callbacks
                .resize_with(handler_index + HANDLER_GROWTH, Vec::new);
        }

        let slots = &mut self.callbacks[handler_index];
        let packet_index = packet_ordinal as usize;
        if packet_index >= slots.len() {
            slots.resize_with(packet_index + 1, || None);
        }
        slots[packet_index] = Some(Box::new(callback));

        debug!(handler_ordinal, packet_ordinal, "Registered packet callback");
    }

    pub fn has_callback(&self, handler_ordinal: u32, packet_ordinal: u32) -> bool {
        self.lookup(handler_ordinal, packet_ordinal).is_some()
    }

    /// Allocated handler slots
    pub fn handler_capacity(&self) -> usize {
        self.callbacks.len()
    }

    /// Allocated packet slots for one handler, zero when out of range
    pub fn packet_capacity(&self, handler_ordinal: u32) -> usize {
        self.callbacks
            .get(handler_ordinal as usize)
            .map_or(0, Vec::len)
    }

    /// Route `packet` using explicit ordinals.
    ///
    /// Returns `false` when nothing is registered; otherwise the callback's verdict.
    pub fn dispatch_to(
        &self,
        handler_ordinal: u32,
        packet_ordinal: u32,
        handler: &mut H,
        connection: &mut C,
        packet: &P,
    ) -> bool {
        match self.lookup(handler_ordinal, packet_ordinal) {
            Some(callback) => callback(handler, connection, packet),
            None => {
                trace!(handler_ordinal, packet_ordinal, "No packet callback registered");
                false
            }
        }
    }

    fn lookup(&self, handler_ordinal: u32, packet_ordinal: u32) -> Option<&Callback<H, C, P>> {
        self.callbacks
            .get(handler_ordinal as usize)?
            .get(packet_ordinal as usize)?
            .as_deref()
    }
}

impl<H, C, P> DispatchTable<H, C, P>
where
    H: HandlerKind + ?Sized,
    C: ?Sized,
    P: PacketKind + ?Sized,
{
    /// Route `packet` to the callback for the handler's and packet's ordinals.
    pub fn dispatch(&self, handler: &mut H, connection: &mut C, packet: &P) -> bool {
        let handler_ordinal = handler.handler_ordinal();
        let packet_ordinal = packet.packet_ordinal();
        self.dispatch_to(handler_ordinal, packet_ordinal, handler, connection, packet)
    }
}

impl<H: ?Sized, C: ?Sized, P: ?Sized> fmt::Debug for DispatchTable<H, C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: usize = self
            .callbacks
            .iter()
            .map(|slots| slots.iter().filter(|slot| slot.is_some()).count())
            .sum();
        f.debug_struct("DispatchTable")
            .field("handler_capacity", &self.callbacks.len())
            .field("registered", &registered)
            .finish()
    }
}
