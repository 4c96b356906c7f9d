//! Logging helpers for selector evaluation.
//!
//! Events are emitted through `tracing` with target "rowselect" and carry an
//! `event` field for filtering. The crate never installs a subscriber;
//! applications configure one themselves.
//!
//! Row-level data is never logged, only sizes and expressions.

/// Target for all rowselect log events.
pub(crate) const ROWSELECT_TARGET: &str = "rowselect";

/// Macro for debug-level log events.
///
/// # Example
/// ```ignore
/// log_debug!(
///     component = "sample",
///     event = "sample_drawn",
///     pool = pool_len,
///     drawn = n,
/// );
/// ```
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::ROWSELECT_TARGET, $($field)*)
    };
}

/// Macro for trace-level log events.
macro_rules! log_trace {
    ($($field:tt)*) => {
        ::tracing::trace!(target: $crate::observability::ROWSELECT_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_trace;
