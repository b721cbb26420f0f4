//! # savehook-std
//!
//! Standard implementations for the savehook entity persistence hook engine.
//!
//! This crate provides:
//! - **Registry**: [`registry::RegistryBuilder`], [`registry::HookRegistry`]
//!   and the process-wide [`void::VoidHookSet`]
//! - **Dispatch**: [`dispatcher::SaveHookDispatcher`] with its
//!   operation-scoped [`cache`]
//! - **Typed hooks**: [`typed::EntityHook`]
//! - **Standard hooks**: Logging, Tracing
//! - **Switch**: [`switch::HookingSwitch`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use savehook_core;

// Modules
pub mod cache;
#[cfg(feature = "inventory")]
pub mod collected;
pub mod dispatcher;
pub mod hooks;
pub mod registry;
pub mod switch;
pub mod testing;
pub mod typed;
pub mod void;

#[cfg(feature = "inventory")]
pub use inventory;
