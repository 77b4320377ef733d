//! Invariant checking for the client state.
//!
//! Invariants are properties that must hold after every applied event,
//! regardless of event order or content. Checks run against a
//! [`ClientSnapshot`], which also carries the history needed for temporal
//! properties such as byte-count monotonicity.

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    ChatOrderIncreasing, ChatRequiresLobby, RosterKeysMatchIds, TransferMonotonicity,
    TransferWithinBounds,
};
pub use snapshot::{ClientSnapshot, TransferSnapshot};

/// A violated invariant.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Result of checking one invariant.
pub type InvariantResult = Result<(), Violation>;

/// A property of the client state.
///
/// Implementations must be pure: the same snapshot always yields the same
/// result.
pub trait Invariant: Send + Sync {
    /// Stable name used in violation reports.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, snapshot: &ClientSnapshot) -> InvariantResult;
}

/// A set of invariants checked together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every client state invariant.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ChatRequiresLobby);
        registry.add(ChatOrderIncreasing);
        registry.add(RosterKeysMatchIds);
        registry.add(TransferWithinBounds);
        registry.add(TransferMonotonicity);
        registry
    }

    /// Register an invariant.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, snapshot: &ClientSnapshot) -> Vec<Violation> {
        self.invariants.iter().filter_map(|inv| inv.check(snapshot).err()).collect()
    }

    /// Check all invariants and panic with every violation listed.
    ///
    /// # Panics
    ///
    /// If any invariant is violated.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, snapshot: &ClientSnapshot, context: &str) {
        let violations = self.check_all(snapshot);
        if !violations.is_empty() {
            let report: Vec<String> = violations.iter().map(ToString::to_string).collect();
            panic!("invariant violations after {context}:\n  {}", report.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    impl Invariant for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        fn check(&self, _: &ClientSnapshot) -> InvariantResult {
            Err(Violation { invariant: self.name(), message: "nope".into() })
        }
    }

    #[test]
    fn standard_registry_accepts_empty_state() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 5);
        assert!(registry.check_all(&ClientSnapshot::default()).is_empty());
    }

    #[test]
    fn violations_are_collected() {
        let mut registry = InvariantRegistry::new();
        assert!(registry.is_empty());
        registry.add(AlwaysFails);

        let violations = registry.check_all(&ClientSnapshot::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "[always_fails] nope");
    }

    #[test]
    #[should_panic(expected = "invariant violations after step 3")]
    fn assert_all_panics_with_context() {
        let mut registry = InvariantRegistry::new();
        registry.add(AlwaysFails);
        registry.assert_all(&ClientSnapshot::default(), "step 3");
    }
}
