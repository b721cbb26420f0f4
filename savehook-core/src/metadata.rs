//! Registration metadata for save hooks.

use crate::{
    entity::{DataContext, EntityDescriptor},
    type_key::TypeKey,
};

/// Static description of one hook implementation.
///
/// Built once at startup, immutable afterwards. By default a hook targets
/// every entity in every context, is not important and has order `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookMetadata {
    hook_type: TypeKey,
    entity_type: TypeKey,
    context_type: TypeKey,
    important: bool,
    order: i32,
}

impl HookMetadata {
    /// Metadata for hook implementation `H`.
    pub fn new<H: ?Sized + 'static>() -> Self {
        Self::for_hook(TypeKey::of::<H>())
    }

    /// Metadata for the hook implementation identified by `hook_type`.
    pub fn for_hook(hook_type: TypeKey) -> Self {
        Self {
            hook_type,
            entity_type: TypeKey::any_entity(),
            context_type: TypeKey::any_context(),
            important: false,
            order: 0,
        }
    }

    /// Targets entity type `T` and everything derived from it.
    pub fn for_entity<T: EntityDescriptor>(self) -> Self {
        self.with_entity_type(T::type_key())
    }

    /// Targets the given entity type and everything derived from it.
    pub fn with_entity_type(mut self, entity_type: TypeKey) -> Self {
        self.entity_type = entity_type;
        self
    }

    /// Restricts the hook to context type `C` and its derivatives.
    pub fn for_context<C: DataContext>(self) -> Self {
        self.with_context_type(C::context_type())
    }

    /// Restricts the hook to the given context type and its derivatives.
    pub fn with_context_type(mut self, context_type: TypeKey) -> Self {
        self.context_type = context_type;
        self
    }

    /// Replaces the hook type. Registries use this to bind metadata to the
    /// instance they actually store.
    pub fn with_hook_type(mut self, hook_type: TypeKey) -> Self {
        self.hook_type = hook_type;
        self
    }

    /// Marks the hook as important: it runs even when hooking is disabled.
    pub fn important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    /// Sets the order (lower runs first).
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Hook implementation type.
    pub fn hook_type(&self) -> TypeKey {
        self.hook_type
    }

    /// Targeted entity type.
    pub fn entity_type(&self) -> TypeKey {
        self.entity_type
    }

    /// Owning context type.
    pub fn context_type(&self) -> TypeKey {
        self.context_type
    }

    /// Whether the hook runs while hooking is disabled.
    pub fn is_important(&self) -> bool {
        self.important
    }

    /// Execution order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns `true` if the hook applies to an entity of `entity_type`
    /// saved through a context of `context_type`.
    pub fn applies_to(&self, context_type: TypeKey, entity_type: TypeKey) -> bool {
        self.context_type.is_assignable_from(context_type)
            && self.entity_type.is_assignable_from(entity_type)
    }
}
