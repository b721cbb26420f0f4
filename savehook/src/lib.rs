//! # savehook - Entity Persistence Hook Engine
//!
//! `savehook` runs typed hooks around the entity writes of a unit-of-work:
//! once before the write (hooks may redirect the pending operation) and once
//! after it succeeded.
//!
//! - Each logical row is dispatched at most once per stage and operation.
//! - A hook that declines an (entity type, state, stage) combination is never
//!   called for it again for the life of the process.
//! - While hooking is switched off, hooks marked important still run.
//! - Hook faults are logged and skipped; they never fail the save.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use savehook::prelude::*;
//! use std::sync::Arc;
//!
//! struct AuditHook;
//!
//! impl SaveHook for AuditHook {
//!     fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
//!         println!("saved {} {:?}", entry.entity_type(), entry.entity_id());
//!         Ok(HookResult::Handled)
//!     }
//! }
//!
//! let registry = Arc::new(RegistryBuilder::new().register(AuditHook).build()?);
//! let mut dispatcher = SaveHookDispatcher::new(registry);
//!
//! let outcome = dispatcher.pre_save(&mut entries);
//! // ... write each entry using `entry.commit_state()` ...
//! dispatcher.post_save(&entries);
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use savehook_core::{
    // Identity
    Ancestors,
    AsEntityId,
    // Errors
    BoxError,
    // Entities and contexts
    DataContext,
    Entity,
    EntityDescriptor,
    EntityId,
    // State
    EntityState,
    HookError,
    // Metadata
    HookMetadata,
    // Hook contract
    HookPhase,
    HookResult,
    HookStage,
    HookedEntity,
    // Properties
    PropertySnapshot,
    PropertyValue,
    RegistryError,
    SaveHook,
    SaveHookError,
    SoftDeletable,
    StateError,
    ToPropertyValue,
    TypeKey,
};

// Registry and dispatch
pub use savehook_std::{
    cache::{HandledKey, ResolutionKey},
    dispatcher::{PreSaveOutcome, ProcessedHooks, SaveHookDispatcher},
    registry::{HookHandle, HookRegistration, HookRegistry, LazyHook, RegistryBuilder},
    switch::{HookingSwitch, SwitchGuard},
    typed::{EntityHook, EntityHookAdapter},
    void::{VoidHookKey, VoidHookSet},
};

#[cfg(feature = "inventory")]
pub use savehook_std::collected::CollectedHook;

/// Standard hook implementations.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use savehook_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use savehook_std::testing::*;
}

/// Prelude module - common imports for savehook.
///
/// # Usage
///
/// ```rust,ignore
/// use savehook::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BoxError,
        // Entities
        DataContext,
        Entity,
        EntityDescriptor,
        EntityHook,
        EntityId,
        EntityState,
        // Registration
        HookMetadata,
        HookResult,
        HookedEntity,
        HookingSwitch,
        RegistryBuilder,
        // Hooks
        SaveHook,
        SaveHookDispatcher,
    };
}

#[cfg(feature = "macros")]
pub use savehook_macros::{DataContext, Entity};

#[cfg(feature = "inventory")]
pub use inventory;
