//! Operations for model-based testing.
//!
//! Each operation is one thing the outside world can do to a client: deliver
//! an event, or let time pass. Ids are drawn from tiny ranges so random
//! sequences keep hitting the same lobbies, members and transfers.

use arbitrary::Arbitrary;
use lobbyframe_proto::{EventKind, EventRecord, Payload};

use crate::events;

/// Small id, folded into `0..4`.
pub type SmallId = u8;

/// Lobby id for a small id.
pub fn lobby_id(id: SmallId) -> u64 {
    u64::from(id % 4) + 1
}

/// Member id for a small id. Member 100 is the local client.
pub fn member_id(id: SmallId) -> u64 {
    u64::from(id % 4) + 100
}

/// Transfer id for a small id.
pub fn transfer_id(id: SmallId) -> String {
    format!("file-{}", id % 4)
}

/// Everything a test can do to a client.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Deliver `self_joined` with ourselves and the host in the roster.
    Join {
        /// Lobby to join.
        lobby: SmallId,
    },

    /// Deliver `self_left`.
    Leave,

    /// Deliver `player_joined`, optionally tagged with a lobby.
    PlayerJoined {
        /// Joining member.
        member: SmallId,
        /// Lobby tag. May be stale.
        lobby: Option<SmallId>,
    },

    /// Deliver `player_left`.
    PlayerLeft {
        /// Leaving member.
        member: SmallId,
    },

    /// Deliver a chat line.
    Chat {
        /// Sender. `None` for system messages.
        member: Option<SmallId>,
        /// Text seed.
        seed: u8,
    },

    /// Deliver `max_players_changed`.
    MaxPlayers {
        /// Lobby tag. May be stale.
        lobby: SmallId,
        /// New capacity.
        max: u8,
    },

    /// Deliver `file_added` with a known size.
    AddFile {
        /// Transfer.
        file: SmallId,
        /// Size in bytes.
        total: u16,
    },

    /// Deliver `transfer_send_progress` in bytes.
    SendProgress {
        /// Transfer.
        file: SmallId,
        /// Reported byte count.
        bytes: u16,
    },

    /// Deliver `transfer_receive_progress` as a percentage.
    ReceivePercent {
        /// Transfer.
        file: SmallId,
        /// Percentage, folded into `0..=100`.
        percent: u8,
    },

    /// Deliver a finished event for either direction.
    Finish {
        /// Transfer.
        file: SmallId,
        /// `transfer_receive_finished` instead of `transfer_send_finished`.
        receive: bool,
    },

    /// Deliver `transfer_cancelled`.
    Cancel {
        /// Transfer.
        file: SmallId,
    },

    /// Deliver `file_removed`.
    RemoveFile {
        /// Transfer.
        file: SmallId,
    },

    /// Deliver `connection_changed`.
    Connection {
        /// New connectivity.
        connected: bool,
    },

    /// Deliver a known event with an empty payload.
    Malformed {
        /// Kind selector.
        kind: u8,
    },

    /// Deliver an event name outside the known set.
    Unknown,

    /// Advance the clock, then sweep terminal transfers.
    AdvanceTime {
        /// Seconds to advance.
        secs: u8,
    },
}

impl Operation {
    /// The event this operation delivers. `None` for clock moves.
    pub fn record(&self) -> Option<EventRecord> {
        let record = match *self {
            Self::Join { lobby } => events::self_joined_with(
                lobby_id(lobby),
                &format!("lobby {}", lobby_id(lobby)),
                member_id(1),
                member_id(0),
                &[(member_id(0), "me"), (member_id(1), "host")],
            ),
            Self::Leave => events::self_left(),
            Self::PlayerJoined { member, lobby } => events::player_joined(
                member_id(member),
                &format!("player {}", member_id(member)),
                lobby.map(lobby_id),
            ),
            Self::PlayerLeft { member } => events::player_left(member_id(member)),
            Self::Chat { member, seed } => {
                events::chat(member.map(member_id), &format!("message {seed}"))
            },
            Self::MaxPlayers { lobby, max } => {
                events::max_players_changed(lobby_id(lobby), u32::from(max))
            },
            Self::AddFile { file, total } => {
                events::file_added(&transfer_id(file), "shared.bin", u64::from(total))
            },
            Self::SendProgress { file, bytes } => {
                events::send_progress(&transfer_id(file), u64::from(bytes))
            },
            Self::ReceivePercent { file, percent } => {
                events::receive_percent(&transfer_id(file), f64::from(percent % 101))
            },
            Self::Finish { file, receive: true } => {
                events::receive_finished(&transfer_id(file), true)
            },
            Self::Finish { file, receive: false } => events::send_finished(&transfer_id(file)),
            Self::Cancel { file } => events::transfer_cancelled(&transfer_id(file)),
            Self::RemoveFile { file } => events::file_removed(&transfer_id(file)),
            Self::Connection { connected } => events::connection_changed(connected),
            Self::Malformed { kind } => {
                let kinds = [
                    EventKind::SelfJoined,
                    EventKind::PlayerJoined,
                    EventKind::Chat,
                    EventKind::FileAdded,
                    EventKind::TransferSendProgress,
                ];
                EventRecord::new(kinds[usize::from(kind) % kinds.len()].name(), Payload::new())
            },
            Self::Unknown => EventRecord::new("lobby_teleported", Payload::new()),
            Self::AdvanceTime { .. } => return None,
        };
        Some(record)
    }
}
