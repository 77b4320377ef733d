//! Lobbyframe core
//!
//! Client-side state machine for a lobby/session transport. Inbound events
//! (lobby membership, roster changes, chat, file-transfer progress) are folded
//! into a single [`ClientState`]; outbound intents are validated against that
//! state and handed to a [`Transport`] without mutating anything.
//!
//! # Architecture
//!
//! Sans-IO, like the rest of the workspace. The [`EventRouter`] never talks to
//! the network: the caller feeds it `(name, payload)` pairs and reads back an
//! [`Outcome`]. The [`CommandGateway`] never waits for a result: every
//! confirmation arrives later as an event.
//!
//! ```text
//! transport ──events──► EventRouter ──► ClientState ──(&)──► rendering
//!     ▲                                     │
//!     └──── Command ◄── CommandGateway ◄────┘ (&, read-only)
//! ```
//!
//! # Components
//!
//! - [`EventRouter`]: decodes and applies inbound events
//! - [`CommandGateway`]: validates and forwards outbound commands
//! - [`ClientState`]: session, lobby, chat log and transfer registry
//! - [`TransferRegistry`]: per-file transfer state machines
//! - [`Environment`]: clock abstraction for deterministic tests
//!
//! # Invariants
//!
//! - At most one lobby is current. Joining replaces, never merges.
//! - The chat log is empty whenever there is no current lobby.
//! - A transfer's `transferred_bytes` never decreases.
//! - An event either applies completely or not at all.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chat;
mod command;
pub mod config;
pub mod env;
mod error;
mod event;
mod lobby;
mod outcome;
mod router;
mod session;
mod state;
mod transfer;

pub use chat::{ChatLog, ChatMessage};
pub use command::{Command, CommandGateway, Delivery, Privacy, Reliability, Transport};
pub use config::ClientConfig;
pub use env::{Environment, SystemEnv};
pub use error::{CommandError, TransportError};
pub use event::{LeaveReason, LobbyEvent, Progress};
pub use lobby::{Lobby, Member};
pub use lobbyframe_proto::{EventKind, Payload, PayloadError, Value};
pub use outcome::{IgnoreReason, Outcome, StaleRef};
pub use router::EventRouter;
pub use session::{LobbySummary, Session, SessionIdentity, TransportFailure};
pub use state::ClientState;
pub use transfer::{Direction, FileTransfer, TransferRegistry, TransferState};

/// Transport-assigned lobby identifier.
pub type LobbyId = u64;

/// Transport peer identifier of a lobby member.
pub type MemberId = u64;

/// Transport-assigned file identifier.
pub type TransferId = String;
