//! Typed entity hooks.
//!
//! Most hooks care about one entity type and a few lifecycle transitions.
//! [`EntityHook`] expresses that directly: implement only the callbacks you
//! need, the rest decline and are memoized as void after their first call.
//!
//! ```ignore
//! struct StampCreated;
//!
//! impl EntityHook for StampCreated {
//!     type Entity = Order;
//!
//!     fn on_inserting(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
//!         if let Some(order) = entry.entity_as_mut::<Order>() {
//!             order.created = now();
//!         }
//!         Ok(HookResult::Handled)
//!     }
//! }
//!
//! let registry = RegistryBuilder::new().register_entity_hook(StampCreated).build()?;
//! ```

use savehook_core::{BoxError, EntityDescriptor, EntityState, HookResult, HookedEntity, SaveHook};

/// A hook bound to entity type [`Self::Entity`] (and types derived from it)
/// with one callback per state transition.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `EntityHook`",
    label = "missing `EntityHook` implementation",
    note = "Declare `type Entity` and override the transitions you handle."
)]
pub trait EntityHook: Send + Sync + 'static {
    /// The hooked entity type.
    type Entity: EntityDescriptor;

    /// Before an added entity is inserted.
    fn on_inserting(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// Before a modified entity is updated.
    fn on_updating(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// Before a deleted entity is removed. Changing the state here redirects
    /// the operation, e.g. to `MODIFIED` for a soft delete.
    fn on_deleting(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// After an added entity was inserted.
    fn on_inserted(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// After a modified entity was updated.
    fn on_updated(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// After a deleted entity was removed.
    fn on_deleted(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let _ = entry;
        Ok(HookResult::Declined)
    }

    /// See [`SaveHook::on_before_save_completed`].
    fn on_before_save_completed(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// See [`SaveHook::on_after_save_completed`].
    fn on_after_save_completed(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Runs an [`EntityHook`] as a [`SaveHook`], selecting the callback by the
/// entry's initial state.
#[derive(Debug, Clone, Default)]
pub struct EntityHookAdapter<H>(H);

impl<H: EntityHook> EntityHookAdapter<H> {
    /// Wraps `hook`.
    pub fn new(hook: H) -> Self {
        Self(hook)
    }

    /// The wrapped hook.
    pub fn inner(&self) -> &H {
        &self.0
    }
}

impl<H: EntityHook> SaveHook for EntityHookAdapter<H> {
    fn on_before_save(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let state = entry.initial_state();
        if state == EntityState::ADDED {
            self.0.on_inserting(entry)
        } else if state == EntityState::MODIFIED {
            self.0.on_updating(entry)
        } else if state == EntityState::DELETED {
            self.0.on_deleting(entry)
        } else {
            Ok(HookResult::Declined)
        }
    }

    fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let state = entry.initial_state();
        if state == EntityState::ADDED {
            self.0.on_inserted(entry)
        } else if state == EntityState::MODIFIED {
            self.0.on_updated(entry)
        } else if state == EntityState::DELETED {
            self.0.on_deleted(entry)
        } else {
            Ok(HookResult::Declined)
        }
    }

    fn on_before_save_completed(&self) -> Result<(), BoxError> {
        self.0.on_before_save_completed()
    }

    fn on_after_save_completed(&self) -> Result<(), BoxError> {
        self.0.on_after_save_completed()
    }
}
