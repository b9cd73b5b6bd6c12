//! Logging abstraction layer
//!
//! Navigation events are reported through a small set of macros that forward to
//! either the `log` crate or the `tracing` crate, selected at compile time.
//!
//! # Features
//!
//! - `log` (default) - Uses the standard `log` crate
//! - `tracing` - Uses the `tracing` crate for structured logging
//!
//! The two backends are mutually exclusive. With neither enabled the macros
//! compile to nothing.
//!
//! # Levels used by the router
//!
//! | Level | Events                                              |
//! |-------|-----------------------------------------------------|
//! | trace | match attempts, cache hits and misses, stale drops  |
//! | debug | navigation starts, cancellations, restored stacks   |
//! | info  | router creation, commits, listener attach/detach    |
//! | warn  | failed resolutions                                  |
//! | error | failures of background refreshes nobody awaits      |
//!
//! # Usage
//!
//! ```ignore
//! use session_navigator::{debug_log, trace_log};
//!
//! trace_log!("Matching '{}'", pathname);
//! debug_log!("Committed '{}' at index {}", path, index);
//! ```

/// Trace-level logging
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Info-level logging
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Warn-level logging
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Error-level logging
///
/// Used for failures that have no caller left to report them to.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}
