//! Observability subsystem for multistore
//!
//! This module provides:
//! - Structured logging through `tracing`
//! - Typed lifecycle events
//! - Operation counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on store state
//! 3. No background threads
//! 4. The library never installs a global subscriber
//!
//! # Conventions
//!
//! All events use the `multistore` target and carry an `event` field taken
//! from [`Event`]. Applications configure output with `tracing_subscriber`
//! or similar.

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsSnapshot, StoreMetrics};

/// Target for all multistore log events.
pub(crate) const STORE_TARGET: &str = "multistore";

/// Debug-level log event.
///
/// # Example
/// ```ignore
/// log_debug!(
///     event = %Event::RecordDeleted,
///     store = %self.name,
///     index = ?index,
/// );
/// ```
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::STORE_TARGET, $($field)*)
    };
}

/// Trace-level log event.
macro_rules! log_trace {
    ($($field:tt)*) => {
        ::tracing::trace!(target: $crate::observability::STORE_TARGET, $($field)*)
    };
}

/// Warn-level log event.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::STORE_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_trace;
pub(crate) use log_warn;
