#![allow(dead_code)]

use savehook::{
    AsEntityId, DataContext, Entity, EntityDescriptor, EntityId, EntityState, HookRegistry,
    HookedEntity, PreSaveOutcome, ProcessedHooks, PropertySnapshot, RegistryBuilder,
    SaveHookDispatcher, SoftDeletable, TypeKey,
};
use std::{
    any::{Any, TypeId},
    sync::Arc,
};

// ============================================================================
// Contexts
// ============================================================================

pub struct ShopContext;

impl DataContext for ShopContext {}

/// A context deriving from [`ShopContext`].
pub struct AdminContext;

impl DataContext for AdminContext {
    fn context_type() -> TypeKey {
        TypeKey::with_base::<Self>(ShopContext::context_type)
    }
}

pub struct ReportingContext;

impl DataContext for ReportingContext {}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: i64,
}

impl Product {
    pub fn new(id: u64, name: &str, price: i64) -> Self {
        Self {
            id,
            name: name.to_owned(),
            price,
        }
    }
}

impl EntityDescriptor for Product {}

impl Entity for Product {
    fn entity_type(&self) -> TypeKey {
        Self::type_key()
    }

    fn id(&self) -> Option<EntityId> {
        self.id.as_entity_id()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn properties(&self) -> PropertySnapshot {
        PropertySnapshot::new()
            .with("id", self.id)
            .with("name", self.name.clone())
            .with("price", self.price)
    }
}

/// A product subtype, embedding its base.
#[derive(Debug, Clone, Default)]
pub struct DiscountedProduct {
    pub product: Product,
    pub discount: i64,
}

impl DiscountedProduct {
    pub fn new(id: u64, name: &str, price: i64, discount: i64) -> Self {
        Self {
            product: Product::new(id, name, price),
            discount,
        }
    }
}

impl EntityDescriptor for DiscountedProduct {
    fn type_key() -> TypeKey {
        TypeKey::with_base::<Self>(Product::type_key)
    }
}

impl Entity for DiscountedProduct {
    fn entity_type(&self) -> TypeKey {
        Self::type_key()
    }

    fn id(&self) -> Option<EntityId> {
        self.product.id()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn upcast(&self, target: TypeId) -> Option<&dyn Any> {
        if target == TypeId::of::<Self>() {
            Some(self as &dyn Any)
        } else {
            self.product.upcast(target)
        }
    }

    fn upcast_mut(&mut self, target: TypeId) -> Option<&mut dyn Any> {
        if target == TypeId::of::<Self>() {
            Some(self as &mut dyn Any)
        } else {
            self.product.upcast_mut(target)
        }
    }

    fn properties(&self) -> PropertySnapshot {
        self.product.properties().with("discount", self.discount)
    }
}

/// A soft-deletable entity.
#[derive(Debug, Clone, Default)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub deleted: bool,
}

impl Customer {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            deleted: false,
        }
    }
}

impl EntityDescriptor for Customer {}

impl SoftDeletable for Customer {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl Entity for Customer {
    fn entity_type(&self) -> TypeKey {
        Self::type_key()
    }

    fn id(&self) -> Option<EntityId> {
        self.id.as_entity_id()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn properties(&self) -> PropertySnapshot {
        PropertySnapshot::new()
            .with("id", self.id)
            .with("name", self.name.clone())
            .with("deleted", self.deleted)
    }

    fn soft_delete(&self) -> Option<&dyn SoftDeletable> {
        Some(self)
    }
}

/// A change-tracking proxy. Reports the wrapped entity's type.
pub struct TrackingProxy<E> {
    pub inner: E,
}

impl<E: Entity> Entity for TrackingProxy<E> {
    fn entity_type(&self) -> TypeKey {
        self.inner.entity_type()
    }

    fn id(&self) -> Option<EntityId> {
        self.inner.id()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn upcast(&self, target: TypeId) -> Option<&dyn Any> {
        if target == TypeId::of::<Self>() {
            Some(self as &dyn Any)
        } else {
            self.inner.upcast(target)
        }
    }

    fn upcast_mut(&mut self, target: TypeId) -> Option<&mut dyn Any> {
        if target == TypeId::of::<Self>() {
            Some(self as &mut dyn Any)
        } else {
            self.inner.upcast_mut(target)
        }
    }

    fn properties(&self) -> PropertySnapshot {
        self.inner.properties()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Wraps `entity` as saved through [`ShopContext`].
pub fn shop<'a>(entity: &'a mut dyn Entity, state: EntityState) -> HookedEntity<'a> {
    HookedEntity::in_context::<ShopContext>(entity, state).unwrap()
}

/// Builds and shares a registry.
pub fn registry(builder: RegistryBuilder) -> Arc<HookRegistry> {
    Arc::new(builder.build().unwrap())
}

/// One write performed by [`UnitOfWork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub entity_type: TypeKey,
    pub id: Option<EntityId>,
    pub state: EntityState,
}

/// A minimal unit-of-work: runs pre-save hooks, "writes" each entry with
/// its committed state, then runs post-save hooks.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    pub writes: Vec<Write>,
}

impl UnitOfWork {
    pub fn save(
        &mut self,
        dispatcher: &mut SaveHookDispatcher,
        entries: &mut [HookedEntity<'_>],
    ) -> (PreSaveOutcome, ProcessedHooks) {
        let outcome = dispatcher.pre_save(entries);
        for entry in entries.iter() {
            self.writes.push(Write {
                entity_type: entry.entity_type(),
                id: entry.entity_id(),
                state: entry.commit_state(),
            });
        }
        let processed = dispatcher.post_save(entries);
        dispatcher.reset();
        (outcome, processed)
    }
}
