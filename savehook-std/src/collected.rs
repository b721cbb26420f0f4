//! Link-time hook collection via `inventory`.
//!
//! ```ignore
//! inventory::submit! {
//!     CollectedHook::new(
//!         || HookMetadata::new::<AuditHook>().important(true),
//!         || Arc::new(AuditHook::default()),
//!     )
//! }
//!
//! let registry = RegistryBuilder::new().collect().build()?;
//! ```

use crate::registry::RegistryBuilder;
use savehook_core::{HookMetadata, SaveHook};
use std::sync::Arc;

/// A hook registration submitted with `inventory::submit!`.
///
/// Both parts are plain function pointers so entries can be built in a
/// `const` context; the hook itself is constructed on first resolution.
pub struct CollectedHook {
    /// Builds the registration metadata.
    pub metadata: fn() -> HookMetadata,
    /// Builds the hook instance.
    pub factory: fn() -> Arc<dyn SaveHook>,
}

impl CollectedHook {
    /// Create a new collected hook entry.
    pub const fn new(metadata: fn() -> HookMetadata, factory: fn() -> Arc<dyn SaveHook>) -> Self {
        Self { metadata, factory }
    }
}

inventory::collect!(CollectedHook);

impl RegistryBuilder {
    /// Adds every [`CollectedHook`] submitted anywhere in the program.
    pub fn collect(mut self) -> Self {
        for entry in inventory::iter::<CollectedHook> {
            self.register_lazy_mut((entry.metadata)(), entry.factory);
        }
        self
    }
}
