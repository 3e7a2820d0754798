//! # Utility Modules
//!
//! Supporting utilities shared by the transport and protocol layers.
//!
//! ## Components
//! - **Logging**: Structured logging setup driven by [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: Thread-safe accept-loop counters

pub mod logging;
pub mod metrics;

pub use metrics::{AcceptorMetrics, AcceptorMetricsSnapshot};
