use savehook_core::{BoxError, HookResult, HookedEntity, SaveHook};

/// A hook wrapper that runs the inner hook inside a `tracing` span.
///
/// The span carries the configured name plus the entity type, id and state
/// of the entry being processed.
pub struct TracingHook<H> {
    inner: H,
    name: &'static str,
}

impl<H> TracingHook<H> {
    /// Create a new `TracingHook` wrapper around a hook.
    pub const fn new(inner: H, name: &'static str) -> Self {
        Self { inner, name }
    }

    /// The wrapped hook.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Clone> Clone for TracingHook<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            name: self.name,
        }
    }
}

impl<H: Copy> Copy for TracingHook<H> {}

impl<H: SaveHook> SaveHook for TracingHook<H> {
    fn on_before_save(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let span = tracing::info_span!(
            "before_save",
            hook = %self.name,
            entity = %entry.entity_type(),
            id = ?entry.entity_id(),
            state = %entry.state()
        );
        let _enter = span.enter();
        self.inner.on_before_save(entry)
    }

    fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        let span = tracing::info_span!(
            "after_save",
            hook = %self.name,
            entity = %entry.entity_type(),
            id = ?entry.entity_id(),
            state = %entry.initial_state()
        );
        let _enter = span.enter();
        self.inner.on_after_save(entry)
    }

    fn on_before_save_completed(&self) -> Result<(), BoxError> {
        let _enter = tracing::info_span!("before_save_completed", hook = %self.name).entered();
        self.inner.on_before_save_completed()
    }

    fn on_after_save_completed(&self) -> Result<(), BoxError> {
        let _enter = tracing::info_span!("after_save_completed", hook = %self.name).entered();
        self.inner.on_after_save_completed()
    }
}
