//! Entity lifecycle states and save stages.

use crate::error::StateError;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Lifecycle state of a tracked entity.
    ///
    /// An entity is always in exactly one state. Combinations are only
    /// meaningful as "any of" filters, e.g. `ADDED | MODIFIED`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityState: u8 {
        /// Not tracked by the unit-of-work.
        const DETACHED = 1 << 0;
        /// Tracked, no pending change.
        const UNCHANGED = 1 << 1;
        /// Pending insert.
        const ADDED = 1 << 2;
        /// Pending delete.
        const DELETED = 1 << 3;
        /// Pending update.
        const MODIFIED = 1 << 4;
    }
}

impl EntityState {
    /// Returns `true` if exactly one lifecycle flag is set.
    pub fn is_single(self) -> bool {
        self.bits().count_ones() == 1
    }

    /// Validates that `self` names exactly one lifecycle state.
    pub fn ensure_single(self) -> Result<Self, StateError> {
        if self.is_empty() {
            Err(StateError::Empty)
        } else if !self.is_single() {
            Err(StateError::Ambiguous(self))
        } else {
            Ok(self)
        }
    }

    /// Returns `true` if `self` is one of the states in `filter`.
    pub fn matches(self, filter: EntityState) -> bool {
        filter.intersects(self)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// The two stages of a save operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookStage {
    /// Before the unit-of-work writes to the store.
    PreSave,
    /// After the write has durably succeeded.
    PostSave,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::PreSave => f.write_str("pre-save"),
            HookStage::PostSave => f.write_str("post-save"),
        }
    }
}
