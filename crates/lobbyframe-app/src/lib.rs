//! Application layer for Lobbyframe
//!
//! Runs the client core on one thread while the transport lives elsewhere.
//! The transport pushes events into an [`EventSender`]; the [`Runtime`] drains
//! the matching [`EventInbox`] once per tick, routes each event, notifies
//! listeners and garbage-collects finished transfers.
//!
//! # Components
//!
//! - [`Runtime`]: Owns the router, drains the inbox, runs listeners
//! - [`EventSender`] / [`EventInbox`]: SPSC event channel (transport → runtime)
//! - [`ChannelTransport`] / [`CommandReceiver`]: command channel (runtime →
//!   transport)
//! - [`RuntimeConfig`]: Per-tick budget and client tunables

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod inbox;
mod listeners;
mod outbox;
mod runtime;

pub use config::RuntimeConfig;
pub use error::ChannelClosed;
pub use inbox::{EventInbox, EventSender, event_channel};
pub use listeners::ListenerId;
pub use outbox::{ChannelTransport, CommandReceiver, command_channel};
pub use runtime::{Runtime, TickReport};
