//! Conditional tracing macros
//!
//! Every routing event goes through these so the engine can be built without
//! the `tracing` feature. Events are emitted under the `vroute` target.

/// Log at warn level, only when tracing feature is enabled
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "vroute", $($arg)*)
    };
}

/// Log at warn level, no-op when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

/// Log at info level, only when tracing feature is enabled
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "vroute", $($arg)*)
    };
}

/// Log at info level, no-op when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Log at debug level, only when tracing feature is enabled
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "vroute", $($arg)*)
    };
}

/// Log at debug level, no-op when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Log at trace level, only when tracing feature is enabled
#[cfg(feature = "tracing")]
macro_rules! trace_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "vroute", $($arg)*)
    };
}

/// Log at trace level, no-op when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
macro_rules! trace_trace {
    ($($arg:tt)*) => {};
}
