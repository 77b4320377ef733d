//! Client configuration.

use std::time::Duration;

/// Default retention window for finished or cancelled transfers.
pub const DEFAULT_TRANSFER_RETENTION: Duration = Duration::from_secs(30);

/// Tunables for the event router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long a terminal transfer stays visible before `sweep` removes it.
    ///
    /// Gives the rendering layer time to show "done" or "cancelled" before the
    /// entry disappears.
    pub transfer_retention: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { transfer_retention: DEFAULT_TRANSFER_RETENTION }
    }
}
