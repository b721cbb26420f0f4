//! Global "hooking enabled" switch.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared runtime toggle for hook execution.
///
/// Clones share the same flag. While disabled, dispatchers created with this
/// switch only run hooks marked important.
#[derive(Debug, Clone)]
pub struct HookingSwitch(Arc<AtomicBool>);

impl HookingSwitch {
    /// A switch that starts on or off.
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Returns `false` while only important hooks may run.
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Turns hooking on or off for every dispatcher sharing this switch.
    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }

    /// Sets the state until the returned guard is dropped, then restores the
    /// previous one.
    ///
    /// ```ignore
    /// {
    ///     let _bulk = switch.scoped(false);
    ///     import_catalog(&mut dispatcher)?; // important hooks only
    /// }
    /// ```
    #[must_use = "the previous state is restored when the guard is dropped"]
    pub fn scoped(&self, enabled: bool) -> SwitchGuard {
        let previous = self.0.swap(enabled, Ordering::AcqRel);
        SwitchGuard {
            switch: self.clone(),
            previous,
        }
    }
}

impl Default for HookingSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Restores a [`HookingSwitch`] on drop.
#[derive(Debug)]
pub struct SwitchGuard {
    switch: HookingSwitch,
    previous: bool,
}

impl Drop for SwitchGuard {
    fn drop(&mut self) {
        self.switch.set(self.previous);
    }
}
