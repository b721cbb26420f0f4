//! Testing utilities for savehook.
//!
//! # Features
//!
//! - [`RecordingHook`]: A hook that records every call it receives and
//!   answers with a scripted [`Behavior`]
//! - [`CallLog`]: An ordered log shared by several hooks, for checking
//!   execution order across hooks
//!
//! Hook identity is the hook type, so tests that register several recording
//! hooks give each a distinct marker type:
//!
//! ```rust,ignore
//! struct Audit;
//! struct Search;
//!
//! let audit = RecordingHook::<Audit>::new();
//! let search = RecordingHook::<Search>::new().before(Behavior::Decline);
//!
//! let registry = RegistryBuilder::new()
//!     .register(audit.clone())
//!     .register(search.clone())
//!     .build()?;
//!
//! // ... dispatch ...
//! assert_eq!(audit.count(HookPhase::BeforeSave), 1);
//! ```

use savehook_core::{
    BoxError, EntityId, EntityState, HookPhase, HookResult, HookedEntity, SaveHook, TypeKey,
};
use std::{
    fmt,
    marker::PhantomData,
    sync::{Arc, Mutex, PoisonError},
};

// ============================================================================
// Behavior
// ============================================================================

/// What a [`RecordingHook`] answers for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Return [`HookResult::Handled`].
    Handle,
    /// Return [`HookResult::Declined`].
    Decline,
    /// Decline when the entry's initial state matches the filter, handle
    /// otherwise.
    DeclineFor(EntityState),
    /// Return an error with the given message.
    Fail(&'static str),
    /// Panic with the given message.
    Panic(&'static str),
    /// Change the entry's state (pre-save only), then handle.
    Redirect(EntityState),
}

#[derive(Debug, Clone)]
struct SimpleError(&'static str);

impl fmt::Display for SimpleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for SimpleError {}

impl Behavior {
    fn answer(
        self,
        entry: Option<&mut HookedEntity<'_>>,
        state: EntityState,
    ) -> Result<HookResult, BoxError> {
        match self {
            Behavior::Handle => Ok(HookResult::Handled),
            Behavior::Decline => Ok(HookResult::Declined),
            Behavior::DeclineFor(filter) if state.matches(filter) => Ok(HookResult::Declined),
            Behavior::DeclineFor(_) => Ok(HookResult::Handled),
            Behavior::Fail(message) => Err(Box::new(SimpleError(message))),
            Behavior::Panic(message) => panic!("{message}"),
            Behavior::Redirect(target) => {
                if let Some(entry) = entry {
                    entry.set_state(target)?;
                }
                Ok(HookResult::Handled)
            }
        }
    }
}

// ============================================================================
// Recorded calls
// ============================================================================

/// One per-entity call received by a [`RecordingHook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// `BeforeSave` or `AfterSave`.
    pub phase: HookPhase,
    /// Entity type of the entry.
    pub entity_type: TypeKey,
    /// Entity id of the entry.
    pub entity_id: Option<EntityId>,
    /// Initial state of the entry when the hook was called.
    pub state: EntityState,
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<RecordedCall>,
    before_completed: usize,
    after_completed: usize,
}

/// An ordered log of `"label:phase"` lines shared by several hooks.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, label: &str, phase: HookPhase) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{label}:{phase}"));
    }

    /// Get a copy of the logged lines.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Clear the log.
    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

// ============================================================================
// Recording Hook
// ============================================================================

/// A hook that records all calls it receives.
///
/// Clones share the recorded calls, so keep a clone to inspect after
/// registering the hook. `M` is a marker that makes differently-marked
/// recording hooks distinct hook types.
pub struct RecordingHook<M = ()> {
    recorder: Arc<Mutex<Recorder>>,
    before: Behavior,
    after: Behavior,
    log: Option<(CallLog, &'static str)>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: 'static> RecordingHook<M> {
    /// Create a recording hook that handles everything.
    pub fn new() -> Self {
        Self {
            recorder: Arc::default(),
            before: Behavior::Handle,
            after: Behavior::Handle,
            log: None,
            _marker: PhantomData,
        }
    }

    /// Set the pre-save behavior.
    pub fn before(mut self, behavior: Behavior) -> Self {
        self.before = behavior;
        self
    }

    /// Set the post-save behavior.
    pub fn after(mut self, behavior: Behavior) -> Self {
        self.after = behavior;
        self
    }

    /// Set both behaviors.
    pub fn with_behavior(self, behavior: Behavior) -> Self {
        self.before(behavior).after(behavior)
    }

    /// Also append every call, completions included, to `log` under `label`.
    pub fn logging_to(mut self, log: &CallLog, label: &'static str) -> Self {
        self.log = Some((log.clone(), label));
        self
    }

    /// Get a copy of the recorded per-entity calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of per-entity calls for `phase`.
    pub fn count(&self, phase: HookPhase) -> usize {
        self.lock().calls.iter().filter(|call| call.phase == phase).count()
    }

    /// States the entries had when `phase` was called, in call order.
    pub fn states(&self, phase: HookPhase) -> Vec<EntityState> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.phase == phase)
            .map(|call| call.state)
            .collect()
    }

    /// Number of `on_before_save_completed` calls.
    pub fn before_completed(&self) -> usize {
        self.lock().before_completed
    }

    /// Number of `on_after_save_completed` calls.
    pub fn after_completed(&self) -> usize {
        self.lock().after_completed
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        *self.lock() = Recorder::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, phase: HookPhase, entry: &HookedEntity<'_>) {
        self.lock().calls.push(RecordedCall {
            phase,
            entity_type: entry.entity_type(),
            entity_id: entry.entity_id(),
            state: entry.initial_state(),
        });
        self.trace(phase);
    }

    fn trace(&self, phase: HookPhase) {
        if let Some((log, label)) = &self.log {
            log.push(label, phase);
        }
    }
}

impl<M: 'static> Default for RecordingHook<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for RecordingHook<M> {
    fn clone(&self) -> Self {
        Self {
            recorder: Arc::clone(&self.recorder),
            before: self.before,
            after: self.after,
            log: self.log.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M> fmt::Debug for RecordingHook<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHook")
            .field("before", &self.before)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

impl<M: 'static> SaveHook for RecordingHook<M> {
    fn on_before_save(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        self.record(HookPhase::BeforeSave, entry);
        let state = entry.initial_state();
        self.before.answer(Some(entry), state)
    }

    fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        self.record(HookPhase::AfterSave, entry);
        self.after.answer(None, entry.initial_state())
    }

    fn on_before_save_completed(&self) -> Result<(), BoxError> {
        self.lock().before_completed += 1;
        self.trace(HookPhase::BeforeSaveCompleted);
        Ok(())
    }

    fn on_after_save_completed(&self) -> Result<(), BoxError> {
        self.lock().after_completed += 1;
        self.trace(HookPhase::AfterSaveCompleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use savehook_core::{DataContext, Entity, EntityDescriptor};
    use std::any::Any;

    struct Shop;
    impl DataContext for Shop {}

    struct Row;
    impl EntityDescriptor for Row {}

    impl Entity for Row {
        fn entity_type(&self) -> TypeKey {
            Self::type_key()
        }

        fn id(&self) -> Option<EntityId> {
            Some(EntityId::new(1))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn clones_share_recordings() {
        let hook = RecordingHook::<()>::new().before(Behavior::Redirect(EntityState::MODIFIED));
        let observer = hook.clone();

        let mut row = Row;
        let mut entry = HookedEntity::in_context::<Shop>(&mut row, EntityState::DELETED).unwrap();
        assert_eq!(hook.on_before_save(&mut entry).unwrap(), HookResult::Handled);
        assert_eq!(entry.state(), EntityState::MODIFIED);

        assert_eq!(observer.states(HookPhase::BeforeSave), [EntityState::DELETED]);
        observer.clear();
        assert!(hook.calls().is_empty());
    }

    #[test]
    fn decline_for_filters_by_state() {
        let hook = RecordingHook::<()>::new()
            .with_behavior(Behavior::DeclineFor(EntityState::ADDED | EntityState::DELETED));

        let mut row = Row;
        let entry = HookedEntity::in_context::<Shop>(&mut row, EntityState::DELETED).unwrap();
        assert_eq!(hook.on_after_save(&entry).unwrap(), HookResult::Declined);

        let mut row = Row;
        let entry = HookedEntity::in_context::<Shop>(&mut row, EntityState::MODIFIED).unwrap();
        assert_eq!(hook.on_after_save(&entry).unwrap(), HookResult::Handled);
    }

    #[test]
    fn failures_carry_the_message() {
        let hook = RecordingHook::<()>::new().after(Behavior::Fail("index offline"));
        let mut row = Row;
        let entry = HookedEntity::in_context::<Shop>(&mut row, EntityState::ADDED).unwrap();
        let err = hook.on_after_save(&entry).unwrap_err();
        assert_eq!(err.to_string(), "index offline");
    }
}
