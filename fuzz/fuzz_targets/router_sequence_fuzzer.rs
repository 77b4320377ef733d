//! Fuzz target for client state under arbitrary event sequences
//!
//! # Strategy
//!
//! - Operations come from the harness vocabulary: joins, leaves, roster
//!   changes, chat, transfer lifecycles, malformed and unknown events, clock
//!   moves with retention sweeps
//! - Ids are folded into tiny ranges so sequences collide on the same lobby,
//!   member and transfer
//!
//! # Invariants
//!
//! - Every invariant in the standard registry holds after every step
//! - Dispatch never panics, whatever the payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use lobbyframe_harness::{Operation, Simulation};

fuzz_target!(|ops: Vec<Operation>| {
    let mut sim = Simulation::new();
    sim.run(&ops);
});
