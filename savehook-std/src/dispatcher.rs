//! The save hook dispatcher.
//!
//! A [`SaveHookDispatcher`] runs the hooks of a shared [`HookRegistry`] over
//! the entries of one save operation:
//!
//! 1. Rows with a persistent id are dispatched at most once per stage.
//! 2. Applicable hooks are resolved per (context, entity type, state, stage,
//!    important-only) and cached for the operation.
//! 3. A hook that declines is recorded as void for the process and evicted
//!    from the cached lists.
//! 4. Faults (errors and panics) are logged and skipped; they never reach
//!    the caller.
//! 5. Every hook that handled at least one entry gets its batch completion
//!    callback exactly once.

use crate::{
    cache::{HandledKey, HandledSet, ResolutionCache, ResolutionKey},
    registry::{HookHandle, HookRegistry},
    switch::HookingSwitch,
};
use savehook_core::{
    BoxError, EntityState, HookError, HookPhase, HookResult, HookStage, HookedEntity, TypeKey,
};
use std::{
    any::Any,
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// Distinct hooks that handled at least one entry, in first-handled order.
#[derive(Debug, Clone, Default)]
pub struct ProcessedHooks {
    hooks: Vec<HookHandle>,
    types: HashSet<TypeKey>,
}

impl ProcessedHooks {
    fn insert(&mut self, hook: &HookHandle) {
        if self.types.insert(hook.hook_type()) {
            self.hooks.push(hook.clone());
        }
    }

    /// Returns `true` if hook type `H` was processed.
    pub fn contains<H: ?Sized + 'static>(&self) -> bool {
        self.contains_type(TypeKey::of::<H>())
    }

    /// Returns `true` if the hook type was processed.
    pub fn contains_type(&self, hook_type: TypeKey) -> bool {
        self.types.contains(&hook_type)
    }

    /// Number of processed hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hook handled anything.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Iterates over the processed hooks.
    pub fn iter(&self) -> std::slice::Iter<'_, HookHandle> {
        self.hooks.iter()
    }

    /// Short names of the processed hook types.
    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(HookHandle::name).collect()
    }
}

impl<'a> IntoIterator for &'a ProcessedHooks {
    type Item = &'a HookHandle;
    type IntoIter = std::slice::Iter<'a, HookHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.hooks.iter()
    }
}

impl IntoIterator for ProcessedHooks {
    type Item = HookHandle;
    type IntoIter = std::vec::IntoIter<HookHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.hooks.into_iter()
    }
}

/// Result of the pre-save stage.
#[derive(Debug, Clone, Default)]
pub struct PreSaveOutcome {
    /// Hooks that handled at least one entry.
    pub processed_hooks: ProcessedHooks,
    /// Whether any hook redirected the pending state of an entry.
    pub any_state_changed: bool,
}

/// Dispatches save hooks for one operation at a time.
///
/// The registry (with its void-hook memo) is shared; the resolution cache
/// and dedup set belong to this dispatcher. Use one dispatcher per operation
/// or call [`reset`](Self::reset) between operations.
#[derive(Debug)]
pub struct SaveHookDispatcher {
    registry: Arc<HookRegistry>,
    switch: HookingSwitch,
    cache: ResolutionCache,
    handled: HandledSet,
}

impl SaveHookDispatcher {
    /// A dispatcher over `registry` with hooking enabled.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self::with_switch(registry, HookingSwitch::default())
    }

    /// A dispatcher over `registry` whose convenience entry points follow
    /// `switch`.
    pub fn with_switch(registry: Arc<HookRegistry>, switch: HookingSwitch) -> Self {
        Self {
            registry,
            switch,
            cache: ResolutionCache::new(),
            handled: HandledSet::new(),
        }
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// The hooking switch.
    pub fn switch(&self) -> &HookingSwitch {
        &self.switch
    }

    /// Number of combinations resolved during the current operation.
    pub fn cached_resolutions(&self) -> usize {
        self.cache.len()
    }

    /// Starts a new operation: forgets cached resolutions and handled rows.
    /// The process-wide void-hook memo is kept.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.handled.clear();
    }

    /// Runs the pre-save stage, important hooks only while the switch is
    /// off.
    pub fn pre_save(&mut self, entries: &mut [HookedEntity<'_>]) -> PreSaveOutcome {
        let important_only = !self.switch.is_enabled();
        self.trigger_pre_save_hooks(entries, important_only)
    }

    /// Runs the post-save stage, important hooks only while the switch is
    /// off.
    pub fn post_save(&mut self, entries: &[HookedEntity<'_>]) -> ProcessedHooks {
        let important_only = !self.switch.is_enabled();
        self.trigger_post_save_hooks(entries, important_only)
    }

    /// Runs `on_before_save` of every applicable hook for every entry, then
    /// `on_before_save_completed` once per processed hook.
    ///
    /// A hook that changes an entry's state makes the new state the entry's
    /// baseline for the following hooks and for the post-save stage.
    pub fn trigger_pre_save_hooks(
        &mut self,
        entries: &mut [HookedEntity<'_>],
        important_only: bool,
    ) -> PreSaveOutcome {
        let mut outcome = PreSaveOutcome::default();
        if entries.is_empty() || self.nothing_to_run(important_only) {
            return outcome;
        }

        let span = tracing::debug_span!(
            "save_hooks",
            stage = %HookStage::PreSave,
            entries = entries.len()
        );
        let _enter = span.enter();

        for entry in entries.iter_mut() {
            if !self.mark_handled(entry, HookStage::PreSave) {
                continue;
            }

            let key = resolution_key(entry, HookStage::PreSave, important_only);
            let hooks = self.cache.resolve(key, &self.registry);
            for hook in &hooks {
                let key = ResolutionKey {
                    state: entry.initial_state(),
                    ..key
                };
                tracing::trace!(
                    hook = hook.name(),
                    entity = %key.entity_type,
                    state = %key.state,
                    "before save"
                );

                match guarded(hook, HookPhase::BeforeSave, || {
                    hook.hook().on_before_save(entry)
                }) {
                    Ok(HookResult::Handled) => outcome.processed_hooks.insert(hook),
                    Ok(HookResult::Declined) => self.register_void(hook, key),
                    Err(err) => report(&err, Some(&key)),
                }

                if entry.has_state_changed() {
                    tracing::debug!(
                        hook = hook.name(),
                        entity = %key.entity_type,
                        from = %entry.initial_state(),
                        to = %entry.state(),
                        "entry state changed"
                    );
                    entry.rebase_initial_state();
                    outcome.any_state_changed = true;
                }
            }
        }

        for hook in &outcome.processed_hooks {
            if let Err(err) = guarded(hook, HookPhase::BeforeSaveCompleted, || {
                hook.hook().on_before_save_completed()
            }) {
                report(&err, None);
            }
        }

        outcome
    }

    /// Runs `on_after_save` of every applicable hook for every entry, then
    /// `on_after_save_completed` once per processed hook.
    pub fn trigger_post_save_hooks(
        &mut self,
        entries: &[HookedEntity<'_>],
        important_only: bool,
    ) -> ProcessedHooks {
        let mut processed = ProcessedHooks::default();
        if entries.is_empty() || self.nothing_to_run(important_only) {
            return processed;
        }

        let span = tracing::debug_span!(
            "save_hooks",
            stage = %HookStage::PostSave,
            entries = entries.len()
        );
        let _enter = span.enter();

        for entry in entries {
            if !self.mark_handled(entry, HookStage::PostSave) {
                continue;
            }

            let key = resolution_key(entry, HookStage::PostSave, important_only);
            let hooks = self.cache.resolve(key, &self.registry);
            for hook in &hooks {
                tracing::trace!(
                    hook = hook.name(),
                    entity = %key.entity_type,
                    state = %key.state,
                    "after save"
                );

                match guarded(hook, HookPhase::AfterSave, || hook.hook().on_after_save(entry)) {
                    Ok(HookResult::Handled) => processed.insert(hook),
                    Ok(HookResult::Declined) => self.register_void(hook, key),
                    Err(err) => report(&err, Some(&key)),
                }
            }
        }

        for hook in &processed {
            if let Err(err) = guarded(hook, HookPhase::AfterSaveCompleted, || {
                hook.hook().on_after_save_completed()
            }) {
                report(&err, None);
            }
        }

        processed
    }

    fn nothing_to_run(&self, important_only: bool) -> bool {
        self.registry.is_empty() || (important_only && self.registry.important_types().is_empty())
    }

    /// Records the entry's row as handled for `stage`. Returns `false` if it
    /// already was. Transient entries are never deduplicated.
    fn mark_handled(&mut self, entry: &HookedEntity<'_>, stage: HookStage) -> bool {
        let Some(id) = entry.entity_id() else {
            return true;
        };
        let fresh = self.handled.mark(HandledKey {
            context_type: entry.context_type(),
            entity_type: entry.entity_type(),
            id,
            state: entry.initial_state(),
            stage,
        });
        if !fresh {
            tracing::trace!(entity = %entry.entity_type(), %id, %stage, "entry already handled");
        }
        fresh
    }

    fn register_void(&mut self, hook: &HookHandle, key: ResolutionKey) {
        self.registry.register_void_hook(key.void_key(hook.hook_type()));
        self.cache.evict(hook.hook_type(), key);
    }
}

fn resolution_key(
    entry: &HookedEntity<'_>,
    stage: HookStage,
    important_only: bool,
) -> ResolutionKey {
    ResolutionKey {
        context_type: entry.context_type(),
        entity_type: entry.entity_type(),
        state: entry.initial_state(),
        stage,
        important_only,
    }
}

/// Invokes a hook callback, turning errors and panics into [`HookError`]s.
/// A lazy hook is constructed inside `call`, so a panicking factory is
/// reported like any other panic.
fn guarded<T>(
    hook: &HookHandle,
    phase: HookPhase,
    call: impl FnOnce() -> Result<T, BoxError>,
) -> Result<T, HookError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(HookError::Failed {
            hook: hook.name(),
            phase,
            source,
        }),
        Err(payload) => Err(HookError::Panicked {
            hook: hook.name(),
            phase,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

fn report(err: &HookError, key: Option<&ResolutionKey>) {
    let entity = key.map_or("-", |key| key.entity_type.short_name());
    let state = key.map_or(EntityState::empty(), |key| key.state);
    match err {
        HookError::Panicked { .. } => tracing::error!(
            hook = err.hook(),
            phase = %err.phase(),
            entity,
            %state,
            error = %err,
            "save hook panicked"
        ),
        HookError::Failed { source, .. } => tracing::warn!(
            hook = err.hook(),
            phase = %err.phase(),
            entity,
            %state,
            error = %source,
            "save hook failed"
        ),
    }
}
