//! Shared maintenance-mode flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide maintenance switch
///
/// Clones share one flag, so the authorizer and the controller always agree.
/// Off by default.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceMode(Arc<AtomicBool>);

impl MaintenanceMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Set the flag, returning the previous value
    pub(crate) fn set(&self, enabled: bool) -> bool {
        self.0.swap(enabled, Ordering::SeqCst)
    }
}
