//! The closed set of inbound event kinds.

use std::{fmt, str::FromStr};

use crate::errors::ProtocolError;

/// Every event name the client understands.
///
/// Names not listed here are reserved for forward compatibility: the router
/// ignores them with a diagnostic instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Local client joined a lobby.
    SelfJoined,
    /// Local client left its lobby.
    SelfLeft,
    /// Another member joined the current lobby.
    PlayerJoined,
    /// Another member left the current lobby.
    PlayerLeft,
    /// Result of a lobby discovery query.
    LobbyList,
    /// Chat line in the current lobby.
    Chat,
    /// Current lobby was renamed.
    NameChanged,
    /// Current lobby capacity changed.
    MaxPlayersChanged,
    /// Details for one discoverable lobby arrived.
    InfoFetched,
    /// A lobby requested by this client was created.
    Created,
    /// Lobby-level metadata key changed.
    LobbyDataChanged,
    /// Member metadata key changed.
    MemberDataChanged,
    /// Member display name changed.
    MemberNameChanged,
    /// A file was shared into the lobby.
    FileAdded,
    /// A shared file was withdrawn.
    FileRemoved,
    /// A member requested one of our files.
    FileRequested,
    /// Upload progress.
    TransferSendProgress,
    /// Upload completed.
    TransferSendFinished,
    /// Download progress.
    TransferReceiveProgress,
    /// Download completed.
    TransferReceiveFinished,
    /// Transfer aborted by either side.
    TransferCancelled,
    /// Transport connectivity changed.
    ConnectionChanged,
    /// Another member sent this client a data message.
    DataReceived,
    /// Transport reported a failed operation.
    Error,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 24] = [
        Self::SelfJoined,
        Self::SelfLeft,
        Self::PlayerJoined,
        Self::PlayerLeft,
        Self::LobbyList,
        Self::Chat,
        Self::NameChanged,
        Self::MaxPlayersChanged,
        Self::InfoFetched,
        Self::Created,
        Self::LobbyDataChanged,
        Self::MemberDataChanged,
        Self::MemberNameChanged,
        Self::FileAdded,
        Self::FileRemoved,
        Self::FileRequested,
        Self::TransferSendProgress,
        Self::TransferSendFinished,
        Self::TransferReceiveProgress,
        Self::TransferReceiveFinished,
        Self::TransferCancelled,
        Self::ConnectionChanged,
        Self::DataReceived,
        Self::Error,
    ];

    /// Wire name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SelfJoined => "self_joined",
            Self::SelfLeft => "self_left",
            Self::PlayerJoined => "player_joined",
            Self::PlayerLeft => "player_left",
            Self::LobbyList => "lobby_list",
            Self::Chat => "chat",
            Self::NameChanged => "name_changed",
            Self::MaxPlayersChanged => "max_players_changed",
            Self::InfoFetched => "info_fetched",
            Self::Created => "created",
            Self::LobbyDataChanged => "lobby_data_changed",
            Self::MemberDataChanged => "member_data_changed",
            Self::MemberNameChanged => "member_name_changed",
            Self::FileAdded => "file_added",
            Self::FileRemoved => "file_removed",
            Self::FileRequested => "file_requested",
            Self::TransferSendProgress => "transfer_send_progress",
            Self::TransferSendFinished => "transfer_send_finished",
            Self::TransferReceiveProgress => "transfer_receive_progress",
            Self::TransferReceiveFinished => "transfer_receive_finished",
            Self::TransferCancelled => "transfer_cancelled",
            Self::ConnectionChanged => "connection_changed",
            Self::DataReceived => "data_received",
            Self::Error => "error",
        }
    }

    /// Look up a kind by wire name. `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether events of this kind only make sense inside a lobby.
    #[must_use]
    pub const fn is_lobby_scoped(self) -> bool {
        matches!(
            self,
            Self::PlayerJoined
                | Self::PlayerLeft
                | Self::Chat
                | Self::NameChanged
                | Self::MaxPlayersChanged
                | Self::LobbyDataChanged
                | Self::MemberDataChanged
                | Self::MemberNameChanged
                | Self::DataReceived
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ProtocolError::UnknownKind(s.to_owned()))
    }
}
