//! Readiness of the dispatcher.

use tracing::debug;

use crate::dispatcher::Dispatcher;

impl Dispatcher {
    /// Returns whether all backends are synchronized with their data source.
    ///
    /// Backends are asked in order on every call. The first one that is not
    /// synchronized ends the check.
    pub fn health(&self) -> bool {
        for (index, entry) in self.entries().iter().enumerate() {
            if !entry.backend().is_synced() {
                debug!("Backend {index} has not synced yet");
                return false;
            }
        }
        true
    }
}
