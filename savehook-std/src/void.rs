//! Process-wide memo of hooks proven to be no-ops.

use dashmap::DashSet;
use savehook_core::{EntityState, HookStage, TypeKey};
use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

/// A (hook, entity type, state, stage) combination a hook declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoidHookKey {
    /// Hook implementation type.
    pub hook_type: TypeKey,
    /// Concrete entity type the hook was invoked for.
    pub entity_type: TypeKey,
    /// Initial state of the entity at invocation.
    pub state: EntityState,
    /// Save stage.
    pub stage: HookStage,
}

/// Append-only set of [`VoidHookKey`]s.
///
/// Reads go straight to a concurrent set and never block. Inserts are
/// serialized by one coarse lock. Entries are never removed.
#[derive(Default)]
pub struct VoidHookSet {
    keys: DashSet<VoidHookKey>,
    write: Mutex<()>,
}

impl VoidHookSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the combination was recorded.
    pub fn contains(&self, key: &VoidHookKey) -> bool {
        self.keys.contains(key)
    }

    /// Records a combination. Returns `false` if it was already present.
    pub fn insert(&self, key: VoidHookKey) -> bool {
        let _guard = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        self.keys.insert(key)
    }

    /// Number of recorded combinations.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Snapshot of the recorded combinations.
    pub fn keys(&self) -> Vec<VoidHookKey> {
        self.keys.iter().map(|key| *key).collect()
    }
}

impl fmt::Debug for VoidHookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoidHookSet")
            .field("len", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    struct HookA;
    struct Product;

    fn key(state: EntityState) -> VoidHookKey {
        VoidHookKey {
            hook_type: TypeKey::of::<HookA>(),
            entity_type: TypeKey::of::<Product>(),
            state,
            stage: HookStage::PreSave,
        }
    }

    #[test]
    fn insert_is_idempotent() {
        let set = VoidHookSet::new();
        assert!(set.insert(key(EntityState::ADDED)));
        assert!(!set.insert(key(EntityState::ADDED)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn keys_differ_by_state_and_stage() {
        let set = VoidHookSet::new();
        set.insert(key(EntityState::ADDED));

        assert!(set.contains(&key(EntityState::ADDED)));
        assert!(!set.contains(&key(EntityState::MODIFIED)));
        assert!(!set.contains(&VoidHookKey {
            stage: HookStage::PostSave,
            ..key(EntityState::ADDED)
        }));
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let set = Arc::new(VoidHookSet::new());
        let states = [
            EntityState::ADDED,
            EntityState::MODIFIED,
            EntityState::DELETED,
            EntityState::UNCHANGED,
        ];

        let handles: Vec<_> = states
            .into_iter()
            .map(|state| {
                let set = Arc::clone(&set);
                thread::spawn(move || {
                    for _ in 0..100 {
                        set.insert(key(state));
                        assert!(set.contains(&key(state)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(set.len(), states.len());
    }
}
