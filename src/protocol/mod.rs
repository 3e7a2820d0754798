//! # Protocol Layer
//!
//! Version negotiation tables and packet routing.
//!
//! ## Components
//! - **Version**: registry of supported wire revisions with O(1) lookups
//! - **Dispatcher**: `(handler ordinal, packet ordinal)` callback table
//!
//! Both are explicit objects built once at startup and passed by reference;
//! neither relies on global state.

pub mod dispatcher;
pub mod version;

#[cfg(test)]
mod tests;
