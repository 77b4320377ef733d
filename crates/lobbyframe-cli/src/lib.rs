//! Event-log replay for the lobbyframe client.
//!
//! Feeds a recorded CBOR event log through the same [`lobbyframe_app::Runtime`]
//! a live client uses and reports what the client ended up believing. Useful
//! for reproducing a field report without a transport.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod replay;

pub use error::ReplayError;
pub use replay::{DEFAULT_TICK_INTERVAL, ReplayConfig, ReplaySummary, replay_file, replay_records};
