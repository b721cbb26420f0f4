//! Entity and context capabilities the engine relies on.
//!
//! The unit-of-work owns its entities; the engine only ever sees them through
//! [`Entity`], which exposes identity, the unproxied type, typed access to
//! the concrete or base representation, and the optional soft-delete
//! capability.

use crate::{property::PropertySnapshot, type_key::TypeKey};
use std::{
    any::{Any, TypeId},
    fmt,
};

/// Persistent identity of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Conversion of an id field into an [`EntityId`].
///
/// Returns `None` for transient (not yet persisted) values.
pub trait AsEntityId {
    /// The persistent identity, or `None` while transient.
    fn as_entity_id(&self) -> Option<EntityId>;
}

impl AsEntityId for EntityId {
    fn as_entity_id(&self) -> Option<EntityId> {
        Some(*self)
    }
}

impl AsEntityId for u64 {
    fn as_entity_id(&self) -> Option<EntityId> {
        (*self != 0).then_some(EntityId(*self))
    }
}

impl AsEntityId for u32 {
    fn as_entity_id(&self) -> Option<EntityId> {
        u64::from(*self).as_entity_id()
    }
}

impl AsEntityId for i64 {
    fn as_entity_id(&self) -> Option<EntityId> {
        u64::try_from(*self).ok().and_then(|id| id.as_entity_id())
    }
}

impl AsEntityId for i32 {
    fn as_entity_id(&self) -> Option<EntityId> {
        i64::from(*self).as_entity_id()
    }
}

impl<T: AsEntityId> AsEntityId for Option<T> {
    fn as_entity_id(&self) -> Option<EntityId> {
        self.as_ref().and_then(AsEntityId::as_entity_id)
    }
}

/// Static type information for an entity type.
pub trait EntityDescriptor: 'static {
    /// Key of this entity type. Derived entities override this to declare
    /// their base via [`TypeKey::with_base`].
    fn type_key() -> TypeKey
    where
        Self: Sized,
    {
        TypeKey::with_base::<Self>(TypeKey::any_entity)
    }
}

/// Logical deletion capability.
pub trait SoftDeletable {
    /// Current value of the deleted flag.
    fn is_deleted(&self) -> bool;

    /// Name of the deleted flag in property snapshots.
    fn deleted_property(&self) -> &'static str {
        "deleted"
    }
}

/// An entity tracked by a unit-of-work.
///
/// Change-tracking stores may hand out proxies; a proxy forwards
/// [`entity_type`](Entity::entity_type) so hooks always resolve against the
/// real type.
pub trait Entity: Any + Send + Sync {
    /// The unproxied runtime type.
    fn entity_type(&self) -> TypeKey;

    /// Persistent identity, `None` while transient.
    fn id(&self) -> Option<EntityId>;

    /// `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// `self` as mutable [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the representation of `self` as the type identified by
    /// `target`: the entity itself, or an embedded base.
    fn upcast(&self, target: TypeId) -> Option<&dyn Any> {
        let this = self.as_any();
        (this.type_id() == target).then_some(this)
    }

    /// Mutable counterpart of [`upcast`](Entity::upcast).
    fn upcast_mut(&mut self, target: TypeId) -> Option<&mut dyn Any> {
        if self.as_any().type_id() == target {
            Some(self.as_any_mut())
        } else {
            None
        }
    }

    /// Current property values.
    fn properties(&self) -> PropertySnapshot {
        PropertySnapshot::default()
    }

    /// The soft-delete capability, when the entity has one.
    fn soft_delete(&self) -> Option<&dyn SoftDeletable> {
        None
    }
}

/// Marker for unit-of-work (context) types hooks can be scoped to.
pub trait DataContext: 'static {
    /// Key of this context type. Derived contexts override this to declare
    /// their base via [`TypeKey::with_base`].
    fn context_type() -> TypeKey
    where
        Self: Sized,
    {
        TypeKey::with_base::<Self>(TypeKey::any_context)
    }
}

impl fmt::Debug for dyn Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("type", &self.entity_type())
            .field("id", &self.id())
            .finish()
    }
}
