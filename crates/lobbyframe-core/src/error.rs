//! Error types for outbound commands.
//!
//! Inbound events never produce errors: anything the router cannot apply is
//! reported as an [`crate::Outcome::Ignored`] instead. Errors here are the
//! synchronous, local rejections of the command gateway and the refusals of
//! the transport behind it.

use thiserror::Error;

use crate::{LobbyId, MemberId, TransferId};

/// Transport refused to accept a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Outbound channel is gone (transport shut down).
    #[error("transport closed")]
    Closed,

    /// Transport rejected the command outright.
    #[error("transport rejected command: {reason}")]
    Rejected {
        /// Transport-supplied reason
        reason: String,
    },
}

/// Local validation failures for outbound commands.
///
/// Returned before the transport is contacted, except for
/// [`CommandError::Transport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Command needs a current lobby.
    #[error("not in a lobby")]
    NotInLobby,

    /// Command needs the session to be outside any lobby.
    #[error("already in lobby {lobby_id}")]
    AlreadyInLobby {
        /// Lobby the session is currently in
        lobby_id: LobbyId,
    },

    /// Chat text is empty or whitespace.
    #[error("chat message is empty")]
    EmptyMessage,

    /// No transfer with this id is tracked.
    #[error("unknown transfer: {id}")]
    UnknownTransfer {
        /// Transfer id
        id: TransferId,
    },

    /// Transfer already reached a terminal state.
    #[error("transfer {id} already finished")]
    TransferFinished {
        /// Transfer id
        id: TransferId,
    },

    /// Member is not in the current roster.
    #[error("unknown member: {member_id}")]
    UnknownMember {
        /// Member id
        member_id: MemberId,
    },

    /// Kicking yourself is not a thing; leave instead.
    #[error("cannot kick self")]
    CannotKickSelf,

    /// The current lobby has no known owner to address.
    #[error("lobby {lobby_id} has no host")]
    NoHost {
        /// Lobby the session is currently in
        lobby_id: LobbyId,
    },

    /// Only the lobby owner may do this.
    #[error("only the lobby host can {operation}")]
    NotHost {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Argument failed local validation.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// Argument name
        field: &'static str,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Transport refused the command.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CommandError {
    /// Returns true if retrying the same command later may succeed.
    ///
    /// Validation failures depend on local state and may clear once events
    /// arrive; a closed transport never comes back.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::EmptyMessage
                | Self::CannotKickSelf
                | Self::InvalidArgument { .. }
                | Self::Transport(TransportError::Closed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_convert() {
        let err: CommandError = TransportError::Closed.into();
        assert_eq!(err, CommandError::Transport(TransportError::Closed));
        assert_eq!(err.to_string(), "transport closed");
        assert!(!err.is_retryable());
    }

    #[test]
    fn state_dependent_errors_are_retryable() {
        assert!(CommandError::NotInLobby.is_retryable());
        assert!(CommandError::AlreadyInLobby { lobby_id: 3 }.is_retryable());
        assert!(CommandError::NoHost { lobby_id: 3 }.is_retryable());
        assert!(!CommandError::EmptyMessage.is_retryable());
    }
}
