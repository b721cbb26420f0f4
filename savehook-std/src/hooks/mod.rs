//! Standard hooks.

pub mod logging;
pub mod tracing;

pub use self::{logging::LoggingHook, tracing::TracingHook};
