//! Deterministic test harness for the lobbyframe client.
//!
//! Everything here runs on a manually advanced clock ([`MockEnv`]), so a
//! failing sequence replays identically.
//!
//! # Operations
//!
//! The [`operation`] module defines [`Operation`], an `Arbitrary` vocabulary of
//! transport events and clock moves. Fuzzers and property tests generate
//! operation sequences and feed them to a [`Simulation`], which drives a real
//! router and refreshes a snapshot after every step.
//!
//! # Invariant Testing
//!
//! The `invariants` module states properties of the client state that hold
//! after any event sequence, in any order. [`InvariantRegistry::standard()`]
//! bundles all of them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod events;
pub mod invariants;
pub mod operation;
pub mod simulation;
pub mod transport;

pub use invariants::{
    ChatOrderIncreasing, ChatRequiresLobby, ClientSnapshot, Invariant, InvariantRegistry,
    InvariantResult, RosterKeysMatchIds, TransferMonotonicity, TransferSnapshot,
    TransferWithinBounds, Violation,
};
pub use lobbyframe_core::env::test_utils::MockEnv;
pub use operation::Operation;
pub use simulation::Simulation;
pub use transport::RecordingTransport;
