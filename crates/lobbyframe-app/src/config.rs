//! Runtime configuration.

use lobbyframe_core::ClientConfig;

/// Default cap on events routed per tick.
pub const DEFAULT_MAX_EVENTS_PER_TICK: usize = 256;

/// Tunables for the [`crate::Runtime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Router configuration.
    pub client: ClientConfig,
    /// Upper bound on events drained by one `tick`. Keeps a burst from the
    /// transport from starving the render loop; leftovers wait for the next
    /// tick.
    pub max_events_per_tick: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { client: ClientConfig::default(), max_events_per_tick: DEFAULT_MAX_EVENTS_PER_TICK }
    }
}
