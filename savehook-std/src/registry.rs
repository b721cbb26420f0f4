//! Registry module for hook management.
//!
//! [`RegistryBuilder`] collects (metadata, hook) pairs at startup;
//! [`HookRegistry`] is the frozen, shareable result. Besides the
//! registrations the registry owns the two process-wide memos every
//! dispatcher consults: the important-hook-type set and the
//! [`VoidHookSet`]. Construct it once and hand it to each dispatcher by
//! `Arc`.

use crate::{
    cache::ResolutionKey,
    typed::{EntityHook, EntityHookAdapter},
    void::{VoidHookKey, VoidHookSet},
};
use savehook_core::{HookMetadata, RegistryError, SaveHook, TypeKey};
use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

type HookFactory = Box<dyn Fn() -> Arc<dyn SaveHook> + Send + Sync>;

/// A hook instance constructed on first use.
pub struct LazyHook {
    factory: HookFactory,
    instance: OnceLock<Arc<dyn SaveHook>>,
}

impl LazyHook {
    /// A hook built by `factory` the first time it is resolved.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn SaveHook> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            instance: OnceLock::new(),
        }
    }

    /// An already constructed hook.
    pub fn ready(hook: Arc<dyn SaveHook>) -> Self {
        Self {
            instance: OnceLock::from(Arc::clone(&hook)),
            factory: Box::new(move || Arc::clone(&hook)),
        }
    }

    /// The hook instance, constructing it if needed.
    pub fn get(&self) -> &Arc<dyn SaveHook> {
        self.instance.get_or_init(|| (self.factory)())
    }

    /// Returns `true` once the instance exists.
    pub fn is_constructed(&self) -> bool {
        self.instance.get().is_some()
    }
}

impl fmt::Debug for LazyHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyHook")
            .field("constructed", &self.is_constructed())
            .finish()
    }
}

/// A registered hook with its metadata.
#[derive(Debug)]
pub struct HookRegistration {
    metadata: HookMetadata,
    hook: Arc<LazyHook>,
}

impl HookRegistration {
    /// Pairs metadata with a (lazy) hook.
    pub fn new(metadata: HookMetadata, hook: LazyHook) -> Self {
        Self {
            metadata,
            hook: Arc::new(hook),
        }
    }

    /// The registration metadata.
    pub fn metadata(&self) -> &HookMetadata {
        &self.metadata
    }

    /// Returns `true` once the hook instance was constructed.
    pub fn is_constructed(&self) -> bool {
        self.hook.is_constructed()
    }

    /// A handle to the hook. Does not construct it.
    pub fn handle(&self) -> HookHandle {
        HookHandle {
            hook_type: self.metadata.hook_type(),
            hook: Arc::clone(&self.hook),
        }
    }
}

/// A resolved hook.
///
/// Identity is the hook implementation type: two handles are equal when they
/// refer to the same registered hook. The instance is constructed on the
/// first call to [`hook`](Self::hook), which the dispatcher makes inside its
/// fault guard.
#[derive(Clone)]
pub struct HookHandle {
    hook_type: TypeKey,
    hook: Arc<LazyHook>,
}

impl HookHandle {
    /// Hook implementation type.
    pub fn hook_type(&self) -> TypeKey {
        self.hook_type
    }

    /// Short name of the hook type, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.hook_type.short_name()
    }

    /// Returns `true` if this handle refers to hook type `H`.
    pub fn is<H: ?Sized + 'static>(&self) -> bool {
        self.hook_type == TypeKey::of::<H>()
    }

    /// The hook instance, constructing it if needed. A panicking factory
    /// panics here and is retried on the next call.
    pub fn hook(&self) -> &dyn SaveHook {
        &**self.hook.get()
    }

    /// Returns `true` once the hook instance exists.
    pub fn is_constructed(&self) -> bool {
        self.hook.is_constructed()
    }
}

impl PartialEq for HookHandle {
    fn eq(&self, other: &Self) -> bool {
        self.hook_type == other.hook_type
    }
}

impl Eq for HookHandle {}

impl Hash for HookHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hook_type.hash(state);
    }
}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookHandle").field(&self.name()).finish()
    }
}

// ============================================================================
// RegistryBuilder - for constructing registries
// ============================================================================

/// Builder for constructing a [`HookRegistry`].
///
/// # Example
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .register(AuditHook::default())
///     .register_with_meta(TaxHook::new(), HookMetadata::new::<TaxHook>().important(true))
///     .register_entity_hook(PriceHook)
///     .build()?;
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    registrations: Vec<HookRegistration>,
}

impl RegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook targeting every entity and context.
    pub fn register<H: SaveHook>(self, hook: H) -> Self {
        self.register_with_meta(hook, HookMetadata::new::<H>())
    }

    /// Register a hook with the given metadata. The metadata's hook type is
    /// bound to `H`.
    pub fn register_with_meta<H: SaveHook>(mut self, hook: H, meta: HookMetadata) -> Self {
        self.register_with_meta_mut(hook, meta);
        self
    }

    /// Register a hook with the given metadata (mutable version).
    pub fn register_with_meta_mut<H: SaveHook>(&mut self, hook: H, meta: HookMetadata) {
        let meta = meta.with_hook_type(TypeKey::of::<H>());
        self.registrations.push(HookRegistration::new(
            meta,
            LazyHook::ready(Arc::new(hook)),
        ));
    }

    /// Register a hook the caller keeps a handle to. The metadata's hook type
    /// is bound to `H`, not to the `Arc`.
    pub fn register_shared<H: SaveHook>(mut self, hook: Arc<H>, meta: HookMetadata) -> Self {
        let meta = meta.with_hook_type(TypeKey::of::<H>());
        self.registrations
            .push(HookRegistration::new(meta, LazyHook::ready(hook)));
        self
    }

    /// Register a hook constructed on first resolution. `meta` identifies
    /// the hook type.
    pub fn register_lazy<F>(mut self, meta: HookMetadata, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn SaveHook> + Send + Sync + 'static,
    {
        self.register_lazy_mut(meta, factory);
        self
    }

    /// Register a lazily constructed hook (mutable version).
    pub fn register_lazy_mut<F>(&mut self, meta: HookMetadata, factory: F)
    where
        F: Fn() -> Arc<dyn SaveHook> + Send + Sync + 'static,
    {
        self.registrations
            .push(HookRegistration::new(meta, LazyHook::new(factory)));
    }

    /// Register a typed [`EntityHook`] targeting `H::Entity`.
    pub fn register_entity_hook<H: EntityHook>(self, hook: H) -> Self {
        self.register_entity_hook_with(hook, |meta| meta)
    }

    /// Register a typed [`EntityHook`], adjusting its metadata (importance,
    /// order, context) with `configure`.
    pub fn register_entity_hook_with<H, F>(mut self, hook: H, configure: F) -> Self
    where
        H: EntityHook,
        F: FnOnce(HookMetadata) -> HookMetadata,
    {
        let meta = configure(HookMetadata::new::<H>().for_entity::<H::Entity>())
            .with_hook_type(TypeKey::of::<H>());
        self.registrations.push(HookRegistration::new(
            meta,
            LazyHook::ready(Arc::new(EntityHookAdapter::new(hook))),
        ));
        self
    }

    /// Build the immutable registry.
    ///
    /// Registrations are ordered by [`HookMetadata::order`] (stable for
    /// equal orders). Fails if one hook type was registered twice.
    pub fn build(mut self) -> Result<HookRegistry, RegistryError> {
        let mut seen = HashSet::with_capacity(self.registrations.len());
        for registration in &self.registrations {
            let hook_type = registration.metadata.hook_type();
            if !seen.insert(hook_type) {
                return Err(RegistryError::Duplicate(hook_type.name()));
            }
        }

        // Sort by order (lower = first)
        self.registrations.sort_by_key(|r| r.metadata.order());
        Ok(HookRegistry {
            registrations: self.registrations,
            important_types: OnceLock::new(),
            void_hooks: VoidHookSet::new(),
        })
    }

    /// Get the number of registered hooks.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if the builder has no hooks.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

// ============================================================================
// HookRegistry - shared hook storage plus process-wide memos
// ============================================================================

/// The registered hooks and the process-wide dispatch memos.
pub struct HookRegistry {
    registrations: Vec<HookRegistration>,
    important_types: OnceLock<HashSet<TypeKey>>,
    void_hooks: VoidHookSet,
}

impl HookRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
            important_types: OnceLock::new(),
            void_hooks: VoidHookSet::new(),
        }
    }

    /// Registrations in resolution order.
    pub fn registrations(&self) -> &[HookRegistration] {
        &self.registrations
    }

    /// Get the number of registered hooks.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Hook types marked important. Computed once, on first use.
    pub fn important_types(&self) -> &HashSet<TypeKey> {
        self.important_types.get_or_init(|| {
            self.registrations
                .iter()
                .filter(|r| r.metadata.is_important())
                .map(|r| r.metadata.hook_type())
                .collect()
        })
    }

    /// The void-hook memo.
    pub fn void_hooks(&self) -> &VoidHookSet {
        &self.void_hooks
    }

    /// Records that `key.hook_type` declined `key`'s combination.
    pub fn register_void_hook(&self, key: VoidHookKey) -> bool {
        let inserted = self.void_hooks.insert(key);
        if inserted {
            tracing::debug!(
                hook = %key.hook_type,
                entity = %key.entity_type,
                state = %key.state,
                stage = %key.stage,
                "registered void hook"
            );
        }
        inserted
    }

    /// Hooks applicable to `key`, in resolution order, void hooks excluded.
    pub fn resolve(&self, key: &ResolutionKey) -> Vec<HookHandle> {
        let important = key.important_only.then(|| self.important_types());
        self.registrations
            .iter()
            .filter(|r| r.metadata.applies_to(key.context_type, key.entity_type))
            .filter(|r| important.is_none_or(|set| set.contains(&r.metadata.hook_type())))
            .filter(|r| !self.void_hooks.contains(&key.void_key(r.metadata.hook_type())))
            .map(HookRegistration::handle)
            .collect()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("registrations", &self.registrations)
            .field("void_hooks", &self.void_hooks)
            .finish()
    }
}
