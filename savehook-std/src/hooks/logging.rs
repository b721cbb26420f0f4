//! Logging hook for save observation.

use savehook_core::{BoxError, HookResult, HookedEntity, SaveHook};

/// A hook that logs every entry it sees for debugging/observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHook;

impl SaveHook for LoggingHook {
    fn on_before_save(&self, entry: &mut HookedEntity<'_>) -> Result<HookResult, BoxError> {
        tracing::debug!(
            context = %entry.context_type(),
            entity = %entry.entity_type(),
            id = ?entry.entity_id(),
            state = %entry.state(),
            "saving entity"
        );
        Ok(HookResult::Handled)
    }

    fn on_after_save(&self, entry: &HookedEntity<'_>) -> Result<HookResult, BoxError> {
        tracing::debug!(
            context = %entry.context_type(),
            entity = %entry.entity_type(),
            id = ?entry.entity_id(),
            state = %entry.initial_state(),
            "saved entity"
        );
        Ok(HookResult::Handled)
    }
}
