//! # savehook-core
//!
//! Core traits and value types for the savehook entity persistence hook
//! engine.
//!
//! This crate has minimal dependencies and is what hook authors import. The
//! dispatcher, registry and standard hooks live in `savehook-std`.
//!
//! # Building Blocks
//!
//! - [`EntityState`] - lifecycle state of a tracked entity
//! - [`TypeKey`] - stable type identifier with a declared base chain, used
//!   for polymorphic hook resolution
//! - [`Entity`] / [`EntityDescriptor`] / [`DataContext`] - what the engine
//!   needs from entities and units-of-work
//! - [`HookedEntity`] - the per-operation wrapper hooks receive
//! - [`HookMetadata`] - static registration data (target types, importance,
//!   order)
//! - [`SaveHook`] - the lifecycle contract every hook implements
//!
//! # Error Types
//!
//! - [`SaveHookError`] - Top-level error type
//! - [`StateError`] - Invalid lifecycle state
//! - [`HookError`] - Hook execution faults
//! - [`RegistryError`] - Invalid registration

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod entity;
mod entry;
mod error;
mod hook;
mod metadata;
mod property;
mod state;
mod type_key;

// Re-exports
pub use entity::{AsEntityId, DataContext, Entity, EntityDescriptor, EntityId, SoftDeletable};
pub use entry::HookedEntity;
pub use error::{BoxError, HookError, RegistryError, SaveHookError, StateError};
pub use hook::{HookPhase, HookResult, SaveHook};
pub use metadata::HookMetadata;
pub use property::{PropertySnapshot, PropertyValue, ToPropertyValue};
pub use state::{EntityState, HookStage};
pub use type_key::{Ancestors, TypeKey};
