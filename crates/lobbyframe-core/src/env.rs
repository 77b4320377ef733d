//! Environment abstraction for deterministic testing.
//!
//! Decouples client logic from the system clock. Transfer retention is the only
//! time-dependent behavior in the core, and it reads time exclusively through
//! [`Environment::now`] so tests can drive the clock by hand.

use std::{fmt, ops::Sub, time::Duration};

/// Abstract environment providing time.
///
/// # Invariants
///
/// - `now()` never goes backwards
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`, tests use a manually advanced
    /// clock.
    type Instant: Copy + Ord + fmt::Debug + Send + Sync + Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;
}

/// Production environment backed by the system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }
}

/// Test environments.
pub mod test_utils {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    };

    use super::Environment;

    /// Environment whose clock only moves when told to.
    ///
    /// Clones share the same clock, so a test can keep one handle and give
    /// another to the router.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        base: Instant,
        elapsed_nanos: Arc<AtomicU64>,
    }

    impl MockEnv {
        /// Create a clock frozen at its starting point.
        pub fn new() -> Self {
            Self { base: Instant::now(), elapsed_nanos: Arc::new(AtomicU64::new(0)) }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
            self.elapsed_nanos.fetch_add(nanos, Ordering::SeqCst);
        }

        /// Time elapsed since the clock was created.
        pub fn elapsed(&self) -> Duration {
            Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        fn now(&self) -> Self::Instant {
            self.base + self.elapsed()
        }
    }
}
