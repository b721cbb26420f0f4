//! The per-operation entity wrapper handed to hooks.

use crate::{
    entity::{DataContext, Entity, EntityId},
    error::StateError,
    property::{PropertySnapshot, PropertyValue},
    state::EntityState,
    type_key::TypeKey,
};
use std::{
    any::{Any, TypeId},
    cell::OnceCell,
    fmt,
};

/// One changed entity inside a save operation.
///
/// Built fresh by the unit-of-work for every save and discarded afterwards.
/// The wrapper owns the pending state: hooks redirect the operation with
/// [`set_state`](Self::set_state) and the unit-of-work reads the outcome back
/// with [`commit_state`](Self::commit_state) before writing.
pub struct HookedEntity<'a> {
    context_type: TypeKey,
    entity: &'a mut dyn Entity,
    entity_type: OnceCell<TypeKey>,
    initial_state: EntityState,
    state: EntityState,
    original: Option<PropertySnapshot>,
}

impl<'a> HookedEntity<'a> {
    /// Wraps `entity`, saved through a context of `context_type`, whose
    /// pending state is `state`.
    pub fn new(
        context_type: TypeKey,
        entity: &'a mut dyn Entity,
        state: EntityState,
    ) -> Result<Self, StateError> {
        let state = state.ensure_single()?;
        Ok(Self {
            context_type,
            entity,
            entity_type: OnceCell::new(),
            initial_state: state,
            state,
            original: None,
        })
    }

    /// Wraps `entity` saved through context type `C`.
    pub fn in_context<C: DataContext>(
        entity: &'a mut dyn Entity,
        state: EntityState,
    ) -> Result<Self, StateError> {
        Self::new(C::context_type(), entity, state)
    }

    /// Attaches the tracker's snapshot of the values last read from the
    /// store.
    pub fn with_original_values(mut self, original: PropertySnapshot) -> Self {
        self.original = Some(original);
        self
    }

    /// Type of the owning unit-of-work.
    pub fn context_type(&self) -> TypeKey {
        self.context_type
    }

    /// The wrapped entity.
    pub fn entity(&self) -> &dyn Entity {
        &*self.entity
    }

    /// The wrapped entity, mutably.
    pub fn entity_mut(&mut self) -> &mut dyn Entity {
        &mut *self.entity
    }

    /// The entity viewed as `T`: its concrete type or an embedded base.
    pub fn entity_as<T: Any>(&self) -> Option<&T> {
        self.entity.upcast(TypeId::of::<T>())?.downcast_ref::<T>()
    }

    /// Mutable counterpart of [`entity_as`](Self::entity_as).
    pub fn entity_as_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.entity.upcast_mut(TypeId::of::<T>())?.downcast_mut::<T>()
    }

    /// The unproxied entity type, computed on first access.
    pub fn entity_type(&self) -> TypeKey {
        *self.entity_type.get_or_init(|| self.entity.entity_type())
    }

    /// Persistent identity, `None` while transient.
    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity.id()
    }

    /// State the entity had when hooking began, or the state a pre-save hook
    /// redirected it to.
    pub fn initial_state(&self) -> EntityState {
        self.initial_state
    }

    /// Adopts the current state as the new baseline.
    ///
    /// Only the dispatcher calls this, after a hook changed the state.
    #[doc(hidden)]
    pub fn rebase_initial_state(&mut self) {
        self.initial_state = self.state;
    }

    /// Current pending state.
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Changes the pending state.
    pub fn set_state(&mut self, state: EntityState) -> Result<(), StateError> {
        self.state = state.ensure_single()?;
        Ok(())
    }

    /// `true` if the state differs from the initial state.
    pub fn has_state_changed(&self) -> bool {
        self.initial_state != self.state
    }

    /// `true` if `property` differs from the original snapshot.
    ///
    /// Only meaningful while the state is `MODIFIED`; always `false` without
    /// an original snapshot.
    pub fn is_property_modified(&self, property: &str) -> bool {
        self.modified_properties()
            .iter()
            .any(|name| name == property)
    }

    /// Names of the properties that differ from the original snapshot, in
    /// name order. Empty unless the state is `MODIFIED` and a snapshot was
    /// attached.
    pub fn modified_properties(&self) -> Vec<String> {
        let Some(original) = self.original.as_ref() else {
            return Vec::new();
        };
        if self.state != EntityState::MODIFIED {
            return Vec::new();
        }
        let current = self.entity.properties();
        original
            .changed_properties(&current)
            .map(str::to_owned)
            .collect()
    }

    /// `true` if the entity is soft deletable and flagged deleted.
    ///
    /// For a `MODIFIED` entity with an original snapshot this reports the
    /// transition only: the flag must have been clear before.
    pub fn is_soft_deleted(&self) -> bool {
        let Some(soft) = self.entity.soft_delete() else {
            return false;
        };
        if !soft.is_deleted() {
            return false;
        }
        if self.state != EntityState::MODIFIED {
            return true;
        }
        match self.original.as_ref().map(|o| o.get(soft.deleted_property())) {
            Some(Some(PropertyValue::Bool(was_deleted))) => !was_deleted,
            _ => true,
        }
    }

    /// The final pending state for the unit-of-work to write.
    pub fn commit_state(&self) -> EntityState {
        self.state
    }
}

impl fmt::Debug for HookedEntity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookedEntity")
            .field("context_type", &self.context_type)
            .field("entity_type", &self.entity_type())
            .field("id", &self.entity_id())
            .field("initial_state", &self.initial_state)
            .field("state", &self.state)
            .finish()
    }
}
