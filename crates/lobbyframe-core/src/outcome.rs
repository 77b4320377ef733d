//! Result of applying one inbound event.

use std::fmt;

use lobbyframe_proto::PayloadError;

use crate::{LobbyId, MemberId, TransferId};

/// What happened to an inbound event.
///
/// Events never fail: anything that cannot be applied is `Ignored` with a
/// reason, and state is left exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State changed.
    Applied,
    /// Event was valid but state already reflected it.
    Unchanged,
    /// Event was dropped without touching state.
    Ignored(IgnoreReason),
}

impl Outcome {
    /// `Applied` when `changed`, else `Unchanged`.
    pub fn changed(changed: bool) -> Self {
        if changed { Self::Applied } else { Self::Unchanged }
    }

    /// Whether state changed.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Whether the event was dropped.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }

    /// Reason the event was dropped, if it was.
    pub fn ignore_reason(&self) -> Option<&IgnoreReason> {
        match self {
            Self::Ignored(reason) => Some(reason),
            Self::Applied | Self::Unchanged => None,
        }
    }
}

impl From<IgnoreReason> for Outcome {
    fn from(reason: IgnoreReason) -> Self {
        Self::Ignored(reason)
    }
}

/// Why an event was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreReason {
    /// Event name is not one the client understands.
    UnknownKind(String),
    /// Payload is missing a required field or has the wrong shape.
    Malformed(PayloadError),
    /// Event only applies inside a lobby and there is none.
    NotInLobby,
    /// Event refers to something that is not live state.
    Stale(StaleRef),
    /// Transfer already finished or was cancelled.
    Terminal(TransferId),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(name) => write!(f, "unknown event kind `{name}`"),
            Self::Malformed(err) => write!(f, "malformed payload: {err}"),
            Self::NotInLobby => f.write_str("not in a lobby"),
            Self::Stale(stale) => write!(f, "stale reference: {stale}"),
            Self::Terminal(id) => write!(f, "transfer {id} already terminal"),
        }
    }
}

/// The id an event used that did not match live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleRef {
    /// Event named a lobby other than the current one.
    Lobby {
        /// Lobby named by the event
        event: LobbyId,
        /// Lobby the session is in
        current: LobbyId,
    },
    /// Member is not in the current roster.
    Member(MemberId),
    /// Lobby is not in the discovery list.
    ListedLobby(LobbyId),
    /// Transfer is not tracked.
    Transfer(TransferId),
}

impl fmt::Display for StaleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby { event, current } => write!(f, "lobby {event} (current {current})"),
            Self::Member(id) => write!(f, "member {id}"),
            Self::ListedLobby(id) => write!(f, "listed lobby {id}"),
            Self::Transfer(id) => write!(f, "transfer {id}"),
        }
    }
}
