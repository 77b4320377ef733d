//! Lobbyframe protocol types
//!
//! The session transport delivers events as a name plus a loosely typed
//! payload (string keys mapping to scalars, lists and nested maps). This crate
//! owns that untyped surface so the client core only ever sees decoded,
//! strongly typed events.
//!
//! # Components
//!
//! - [`Value`] / [`Payload`]: dynamic payload values with typed field access
//! - [`EventKind`]: the closed set of event names the client understands
//! - [`EventRecord`]: one `{type, data}` envelope, plus CBOR event-log
//!   encoding used for recording and replaying sessions
//!
//! # Invariants
//!
//! - Payload keys are always strings. Non-string keys are rejected while
//!   decoding.
//! - Field accessors never panic. A missing or mistyped field is reported as a
//!   [`PayloadError`] naming the field.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod kind;
mod record;
mod value;

pub use errors::{PayloadError, ProtocolError, Result};
pub use kind::EventKind;
pub use record::{EventLog, EventRecord, MAX_LOG_SIZE, RejectedRecord, decode_log, encode_log};
pub use value::{Payload, Value};
