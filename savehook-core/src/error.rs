//! Error types for savehook.
//!
//! - [`SaveHookError`] - Top-level error type
//! - [`StateError`] - A state value that is not exactly one lifecycle state
//! - [`HookError`] - A fault raised by a hook (reported, never propagated)
//! - [`RegistryError`] - Invalid hook registration

use crate::{hook::HookPhase, state::EntityState};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all savehook operations.
#[derive(Error, Debug)]
pub enum SaveHookError {
    /// Invalid entity state.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A hook fault.
    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    /// Invalid registration.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// A state value where a single lifecycle state is required.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// No state flag set.
    #[error("entity state is empty")]
    Empty,

    /// More than one state flag set.
    #[error("entity state `{0}` combines several lifecycle states")]
    Ambiguous(EntityState),
}

/// A fault raised while invoking a hook.
#[derive(Error, Debug)]
pub enum HookError {
    /// The hook returned an error.
    #[error("hook `{hook}` failed during {phase}")]
    Failed {
        /// Hook type name.
        hook: &'static str,
        /// Phase being dispatched.
        phase: HookPhase,
        /// The hook's error.
        #[source]
        source: BoxError,
    },

    /// The hook panicked.
    #[error("hook `{hook}` panicked during {phase}: {message}")]
    Panicked {
        /// Hook type name.
        hook: &'static str,
        /// Phase being dispatched.
        phase: HookPhase,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl HookError {
    /// Name of the faulting hook type.
    pub fn hook(&self) -> &'static str {
        match self {
            HookError::Failed { hook, .. } | HookError::Panicked { hook, .. } => hook,
        }
    }

    /// Phase during which the fault happened.
    pub fn phase(&self) -> HookPhase {
        match self {
            HookError::Failed { phase, .. } | HookError::Panicked { phase, .. } => *phase,
        }
    }
}

/// Errors raised while building a hook registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same hook implementation type was registered twice.
    #[error("hook `{0}` is registered more than once")]
    Duplicate(&'static str),
}

impl From<BoxError> for SaveHookError {
    fn from(err: BoxError) -> Self {
        SaveHookError::Custom(err)
    }
}
