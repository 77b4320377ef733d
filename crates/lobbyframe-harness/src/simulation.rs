//! Deterministic client simulation.
//!
//! [`Simulation`] drives a real [`EventRouter`] on a [`MockEnv`] clock and
//! refreshes a [`ClientSnapshot`] after every step, so invariants can be
//! checked at any point of a run.

use std::time::Duration;

use lobbyframe_core::{
    ClientConfig, ClientState, EventRouter, Outcome, SessionIdentity, env::test_utils::MockEnv,
};

use crate::{ClientSnapshot, InvariantRegistry, Operation, Violation};

/// A client under test.
pub struct Simulation {
    env: MockEnv,
    router: EventRouter<MockEnv>,
    snapshot: ClientSnapshot,
    registry: InvariantRegistry,
    steps: usize,
}

impl Simulation {
    /// Fresh client with the default config and the standard invariants.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Fresh client with `config` and the standard invariants.
    ///
    /// The local member id is [`operation::member_id`]`(0)`.
    pub fn with_config(config: ClientConfig) -> Self {
        let env = MockEnv::new();
        let identity = SessionIdentity::new("me", "127.0.0.1");
        let router = EventRouter::new(env.clone(), identity, config);
        let snapshot = ClientSnapshot::capture(router.state());
        Self { env, router, snapshot, registry: InvariantRegistry::standard(), steps: 0 }
    }

    /// Apply one operation and refresh the snapshot.
    ///
    /// Returns the router's outcome, or `None` for a clock move.
    pub fn step(&mut self, op: &Operation) -> Option<Outcome> {
        let outcome = match op {
            Operation::AdvanceTime { secs } => {
                self.env.advance(Duration::from_secs(u64::from(*secs)));
                self.router.sweep();
                None
            },
            _ => op.record().map(|record| self.router.dispatch(&record.kind, &record.payload)),
        };
        self.steps += 1;
        self.snapshot.observe(self.router.state());
        outcome
    }

    /// Apply every operation, checking invariants after each one.
    ///
    /// # Panics
    ///
    /// On the first step that violates an invariant.
    pub fn run(&mut self, ops: &[Operation]) {
        for op in ops {
            self.step(op);
            self.assert_invariants(&format!("step {} ({op:?})", self.steps));
        }
    }

    /// Violations in the current snapshot.
    pub fn check(&self) -> Vec<Violation> {
        self.registry.check_all(&self.snapshot)
    }

    /// Panic if any invariant is violated.
    ///
    /// # Panics
    ///
    /// If any invariant is violated.
    pub fn assert_invariants(&self, context: &str) {
        self.registry.assert_all(&self.snapshot, context);
    }

    /// Current client state.
    pub fn state(&self) -> &ClientState<std::time::Instant> {
        self.router.state()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &ClientSnapshot {
        &self.snapshot
    }

    /// The clock.
    pub fn env(&self) -> &MockEnv {
        &self.env
    }

    /// Steps applied so far.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
