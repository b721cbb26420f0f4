//! Operation-scoped resolution cache and dedup set.
//!
//! Neither structure is shared between threads: each dispatcher owns its own
//! pair and clears them between operations.

use crate::{
    registry::{HookHandle, HookRegistry},
    void::VoidHookKey,
};
use savehook_core::{EntityId, EntityState, HookStage, TypeKey};
use std::collections::{HashMap, HashSet};

/// The combination a list of resolved hooks is cached under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    /// Owning context type.
    pub context_type: TypeKey,
    /// Unproxied entity type.
    pub entity_type: TypeKey,
    /// Initial state of the entry.
    pub state: EntityState,
    /// Save stage.
    pub stage: HookStage,
    /// Only important hooks.
    pub important_only: bool,
}

impl ResolutionKey {
    /// The same key with the important-only flag flipped.
    pub fn inverse(self) -> Self {
        Self {
            important_only: !self.important_only,
            ..self
        }
    }

    /// The void-hook key of `hook_type` for this combination.
    pub fn void_key(&self, hook_type: TypeKey) -> VoidHookKey {
        VoidHookKey {
            hook_type,
            entity_type: self.entity_type,
            state: self.state,
            stage: self.stage,
        }
    }
}

/// Resolved hook lists of one operation.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<ResolutionKey, Vec<HookHandle>>,
}

impl ResolutionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks for `key`, resolving against `registry` on a miss.
    pub fn resolve(&mut self, key: ResolutionKey, registry: &HookRegistry) -> Vec<HookHandle> {
        self.entries
            .entry(key)
            .or_insert_with(|| {
                let hooks = registry.resolve(&key);
                tracing::debug!(
                    context = %key.context_type,
                    entity = %key.entity_type,
                    state = %key.state,
                    stage = %key.stage,
                    important_only = key.important_only,
                    hooks = hooks.len(),
                    "resolved save hooks"
                );
                hooks
            })
            .clone()
    }

    /// Drops `hook_type` from the lists cached under `key` and its inverse.
    pub fn evict(&mut self, hook_type: TypeKey, key: ResolutionKey) {
        for key in [key, key.inverse()] {
            if let Some(hooks) = self.entries.get_mut(&key) {
                hooks.retain(|hook| hook.hook_type() != hook_type);
            }
        }
    }

    /// Cached hooks for `key`, without resolving.
    pub fn get(&self, key: &ResolutionKey) -> Option<&[HookHandle]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of cached combinations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every cached combination.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Identity of one logical row at one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandledKey {
    /// Owning context type.
    pub context_type: TypeKey,
    /// Unproxied entity type.
    pub entity_type: TypeKey,
    /// Persistent identity.
    pub id: EntityId,
    /// Initial state of the entry.
    pub state: EntityState,
    /// Save stage.
    pub stage: HookStage,
}

/// Rows already dispatched during the current operation.
#[derive(Debug, Default)]
pub struct HandledSet {
    keys: HashSet<HandledKey>,
}

impl HandledSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` handled. Returns `false` if it already was.
    pub fn mark(&mut self, key: HandledKey) -> bool {
        self.keys.insert(key)
    }

    /// Number of handled rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no row was handled.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Forgets every handled row.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
