//! # Save Hook Contract
//!
//! Every hook implementation satisfies the same fixed lifecycle:
//!
//! 1. [`on_before_save`](SaveHook::on_before_save) per entity, before the
//!    unit-of-work writes. The hook may redirect the pending operation by
//!    changing the entry's state.
//! 2. [`on_before_save_completed`](SaveHook::on_before_save_completed) once
//!    per batch, for every hook that handled at least one entity.
//! 3. [`on_after_save`](SaveHook::on_after_save) per entity, after the write
//!    has durably succeeded. Read-only.
//! 4. [`on_after_save_completed`](SaveHook::on_after_save_completed) once per
//!    batch.
//!
//! # Declining
//!
//! A per-entity callback returns [`HookResult::Declined`] to say "nothing to
//! do for this entity type in this state at this stage". The dispatcher
//! remembers that for the life of the process and never calls the hook for
//! that combination again. The default implementations decline, so a hook
//! only overrides the phases it cares about.

use crate::{entry::HookedEntity, error::BoxError, state::HookStage};
use std::{fmt, sync::Arc};

/// Outcome of a per-entity hook callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookResult {
    /// The hook processed the entity.
    Handled,
    /// The hook has no behavior for this (entity type, state, stage).
    Declined,
}

/// A callback point in the save lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Per-entity, before the write.
    BeforeSave,
    /// Per-batch, after all pre-save calls.
    BeforeSaveCompleted,
    /// Per-entity, after the write.
    AfterSave,
    /// Per-batch, after all post-save calls.
    AfterSaveCompleted,
}

impl HookPhase {
    /// The save stage this phase belongs to.
    pub fn stage(self) -> HookStage {
        match self {
            HookPhase::BeforeSave | HookPhase::BeforeSaveCompleted => HookStage::PreSave,
            HookPhase::AfterSave | HookPhase::AfterSaveCompleted => HookStage::PostSave,
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookPhase::BeforeSave => "before-save",
            HookPhase::BeforeSaveCompleted => "before-save completion",
            HookPhase::AfterSave => "after-save",
            HookPhase::AfterSaveCompleted => "after-save completion",
        })
    }
}

/// A hook invoked around entity persistence.
///
/// Hooks are shared across threads and operations; any per-batch state must
/// be kept behind interior mutability and reset in the completion callbacks.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `SaveHook`",
    label = "missing `SaveHook` implementation",
    note = "Implement `on_before_save` and/or `on_after_save`; unimplemented phases decline."
)]
pub trait SaveHook: Send + Sync + 'static {
    /// Called for each entity before the unit-of-work writes it.
    fn on_before_save(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// Called for each entity after the write succeeded.
    fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// Called once per batch after all pre-save calls, if this hook handled
    /// at least one entity.
    fn on_before_save_completed(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once per batch after all post-save calls, if this hook handled
    /// at least one entity.
    fn on_after_save_completed(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<H: SaveHook + ?Sized> SaveHook for Arc<H> {
    fn on_before_save(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        (**self).on_before_save(entry)
    }

    fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        (**self).on_after_save(entry)
    }

    fn on_before_save_completed(&self) -> Result<(), BoxError> {
        (**self).on_before_save_completed()
    }

    fn on_after_save_completed(&self) -> Result<(), BoxError> {
        (**self).on_after_save_completed()
    }
}

impl<H: SaveHook + ?Sized> SaveHook for Box<H> {
    fn on_before_save(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        (**self).on_before_save(entry)
    }

    fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        (**self).on_after_save(entry)
    }

    fn on_before_save_completed(&self) -> Result<(), BoxError> {
        (**self).on_before_save_completed()
    }

    fn on_after_save_completed(&self) -> Result<(), BoxError> {
        (**self).on_after_save_completed()
    }
}
