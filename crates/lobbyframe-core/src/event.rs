//! Typed inbound events.
//!
//! [`LobbyEvent::decode`] turns an untyped `(kind, payload)` pair into a typed
//! event, reading every field up front. Decoding either yields a complete
//! event or a [`PayloadError`], so the router never sees half an event.

use std::collections::BTreeMap;

use lobbyframe_proto::{EventKind, Payload, PayloadError, Value};

use crate::{
    Direction, FileTransfer, Lobby, LobbyId, LobbySummary, Member, MemberId, TransferId,
    TransportFailure,
};

/// Why the session left its lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// We asked to leave.
    UserLeave,
    /// Connection to the lobby was lost.
    Disconnected,
    /// The host removed us.
    Kicked,
}

impl LeaveReason {
    /// Wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserLeave => "user_leave",
            Self::Disconnected => "disconnected",
            Self::Kicked => "kicked",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "user_leave" => Some(Self::UserLeave),
            "disconnected" => Some(Self::Disconnected),
            "kicked" => Some(Self::Kicked),
            _ => None,
        }
    }
}

/// Transfer progress as the transport reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Absolute byte count.
    Bytes(u64),
    /// Percentage in `0.0..=100.0` of the transfer's total size.
    Percent(f64),
}

/// A fully decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    /// We joined a lobby. Carries the complete lobby snapshot.
    SelfJoined {
        /// Lobby snapshot, roster and metadata included.
        lobby: Lobby,
        /// Our member id in that lobby.
        self_id: Option<MemberId>,
    },

    /// We left the current lobby.
    SelfLeft {
        /// Why, when the transport says.
        reason: Option<LeaveReason>,
    },

    /// A member joined the current lobby.
    PlayerJoined {
        /// The new member.
        member: Member,
        /// Lobby the event belongs to, when tagged.
        lobby_id: Option<LobbyId>,
    },

    /// A member left the current lobby.
    PlayerLeft {
        /// Departing member.
        member_id: MemberId,
        /// Lobby the event belongs to, when tagged.
        lobby_id: Option<LobbyId>,
    },

    /// Result of a lobby discovery query.
    LobbyList {
        /// Every discoverable lobby.
        lobbies: Vec<LobbySummary>,
    },

    /// Chat line in the current lobby.
    Chat {
        /// Sender, `None` for system messages.
        member: Option<MemberId>,
        /// Message text.
        text: String,
        /// Lobby the event belongs to, when tagged.
        lobby_id: Option<LobbyId>,
    },

    /// Lobby renamed.
    NameChanged {
        /// Lobby renamed.
        lobby_id: LobbyId,
        /// New name.
        name: String,
    },

    /// Lobby capacity changed.
    MaxPlayersChanged {
        /// Lobby changed.
        lobby_id: LobbyId,
        /// New capacity.
        max_players: u32,
    },

    /// Details for a listed lobby.
    InfoFetched {
        /// Listed lobby.
        id: LobbyId,
        /// Display name, if reported.
        name: Option<String>,
        /// Capacity, if reported.
        max_players: Option<u32>,
        /// Occupancy, if reported.
        player_count: Option<u32>,
    },

    /// A lobby we asked for was created.
    Created {
        /// The new lobby.
        summary: LobbySummary,
    },

    /// Lobby metadata key changed.
    LobbyDataChanged {
        /// Lobby changed.
        lobby_id: LobbyId,
        /// Metadata key.
        key: String,
        /// New value, `None` removes the key.
        value: Option<String>,
    },

    /// Member metadata key changed.
    MemberDataChanged {
        /// Member changed.
        member_id: MemberId,
        /// Metadata key.
        key: String,
        /// New value, `None` removes the key.
        value: Option<Value>,
        /// Lobby the event belongs to, when tagged.
        lobby_id: Option<LobbyId>,
    },

    /// Member display name changed.
    MemberNameChanged {
        /// Member changed.
        member_id: MemberId,
        /// New name.
        name: String,
        /// Lobby the event belongs to, when tagged.
        lobby_id: Option<LobbyId>,
    },

    /// A file was shared. Carries a fresh `Requested` transfer.
    FileAdded {
        /// Transfer to track.
        transfer: FileTransfer,
    },

    /// A shared file was withdrawn.
    FileRemoved {
        /// Transfer id.
        id: TransferId,
    },

    /// A member requested one of our files.
    FileRequested {
        /// Transfer id.
        id: TransferId,
        /// File path, if reported.
        path: Option<String>,
        /// Size, if reported.
        total_bytes: Option<u64>,
        /// Requesting member.
        member: Option<MemberId>,
    },

    /// Bytes moved.
    TransferProgress {
        /// Upload (`transfer_send_progress`) or download
        /// (`transfer_receive_progress`).
        direction: Direction,
        /// Transfer id.
        id: TransferId,
        /// Reported progress.
        progress: Progress,
    },

    /// Transfer completed.
    TransferFinished {
        /// Upload or download.
        direction: Direction,
        /// Transfer id.
        id: TransferId,
        /// Download integrity flag.
        valid: Option<bool>,
    },

    /// Transfer aborted.
    TransferCancelled {
        /// Transfer id.
        id: TransferId,
    },

    /// Transport connectivity changed.
    ConnectionChanged {
        /// New state.
        connected: bool,
    },

    /// Data message from another member.
    DataReceived {
        /// Sending member.
        from: MemberId,
        /// Transport service that carried it, when reported.
        service: Option<String>,
        /// Channel it arrived on.
        channel: u32,
        /// Message body.
        data: Payload,
    },

    /// Transport reported a failure.
    Error(TransportFailure),
}

impl LobbyEvent {
    /// Kind this event was decoded from.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SelfJoined { .. } => EventKind::SelfJoined,
            Self::SelfLeft { .. } => EventKind::SelfLeft,
            Self::PlayerJoined { .. } => EventKind::PlayerJoined,
            Self::PlayerLeft { .. } => EventKind::PlayerLeft,
            Self::LobbyList { .. } => EventKind::LobbyList,
            Self::Chat { .. } => EventKind::Chat,
            Self::NameChanged { .. } => EventKind::NameChanged,
            Self::MaxPlayersChanged { .. } => EventKind::MaxPlayersChanged,
            Self::InfoFetched { .. } => EventKind::InfoFetched,
            Self::Created { .. } => EventKind::Created,
            Self::LobbyDataChanged { .. } => EventKind::LobbyDataChanged,
            Self::MemberDataChanged { .. } => EventKind::MemberDataChanged,
            Self::MemberNameChanged { .. } => EventKind::MemberNameChanged,
            Self::FileAdded { .. } => EventKind::FileAdded,
            Self::FileRemoved { .. } => EventKind::FileRemoved,
            Self::FileRequested { .. } => EventKind::FileRequested,
            Self::TransferProgress { direction: Direction::Upload, .. } => {
                EventKind::TransferSendProgress
            },
            Self::TransferProgress { direction: Direction::Download, .. } => {
                EventKind::TransferReceiveProgress
            },
            Self::TransferFinished { direction: Direction::Upload, .. } => {
                EventKind::TransferSendFinished
            },
            Self::TransferFinished { direction: Direction::Download, .. } => {
                EventKind::TransferReceiveFinished
            },
            Self::TransferCancelled { .. } => EventKind::TransferCancelled,
            Self::ConnectionChanged { .. } => EventKind::ConnectionChanged,
            Self::DataReceived { .. } => EventKind::DataReceived,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Decode a payload for `kind`.
    ///
    /// `self_id` is the session's member id, used to infer the direction of
    /// a `file_added` that does not state one.
    ///
    /// Unknown payload fields are ignored.
    pub fn decode(
        kind: EventKind,
        payload: &Payload,
        self_id: Option<MemberId>,
    ) -> Result<Self, PayloadError> {
        let event = match kind {
            EventKind::SelfJoined => Self::SelfJoined {
                lobby: decode_lobby(payload)?,
                self_id: payload.opt_u64("self_id")?,
            },
            EventKind::SelfLeft => {
                let reason = payload
                    .opt_str("reason")?
                    .map(|name| {
                        LeaveReason::from_name(name).ok_or(PayloadError::WrongType {
                            field: "reason",
                            expected: "user_leave, disconnected or kicked",
                        })
                    })
                    .transpose()?;
                Self::SelfLeft { reason }
            },
            EventKind::PlayerJoined => Self::PlayerJoined {
                member: decode_member(payload)?,
                lobby_id: payload.opt_u64("lobby_id")?,
            },
            EventKind::PlayerLeft => Self::PlayerLeft {
                member_id: payload.u64("id")?,
                lobby_id: payload.opt_u64("lobby_id")?,
            },
            EventKind::LobbyList => {
                let lobbies = payload
                    .maps("lobbies")?
                    .into_iter()
                    .enumerate()
                    .map(|(index, entry)| {
                        decode_summary(entry).map_err(|e| e.within("lobbies", index))
                    })
                    .collect::<Result<_, _>>()?;
                Self::LobbyList { lobbies }
            },
            EventKind::Chat => Self::Chat {
                member: payload.opt_u64("member")?,
                text: payload.str("text")?.to_owned(),
                lobby_id: payload.opt_u64("lobby_id")?,
            },
            EventKind::NameChanged => Self::NameChanged {
                lobby_id: payload.u64("lobby_id")?,
                name: payload.str("name")?.to_owned(),
            },
            EventKind::MaxPlayersChanged => Self::MaxPlayersChanged {
                lobby_id: payload.u64("lobby_id")?,
                max_players: payload.u32("max_players")?,
            },
            EventKind::InfoFetched => Self::InfoFetched {
                id: payload.u64("id")?,
                name: payload.opt_str("name")?.map(str::to_owned),
                max_players: payload.opt_u32("max_players")?,
                player_count: payload.opt_u32("player_count")?,
            },
            EventKind::Created => Self::Created { summary: decode_summary(payload)? },
            EventKind::LobbyDataChanged => Self::LobbyDataChanged {
                lobby_id: payload.u64("lobby_id")?,
                key: payload.str("key")?.to_owned(),
                value: payload.opt_str("value")?.map(str::to_owned),
            },
            EventKind::MemberDataChanged => Self::MemberDataChanged {
                member_id: payload.u64("member_id")?,
                key: payload.str("key")?.to_owned(),
                value: payload.get("value").filter(|v| !v.is_null()).cloned(),
                lobby_id: payload.opt_u64("lobby_id")?,
            },
            EventKind::MemberNameChanged => Self::MemberNameChanged {
                member_id: payload.u64("member_id")?,
                name: payload.str("name")?.to_owned(),
                lobby_id: payload.opt_u64("lobby_id")?,
            },
            EventKind::FileAdded => Self::FileAdded { transfer: decode_file(payload, self_id)? },
            EventKind::FileRemoved => Self::FileRemoved { id: decode_transfer_id(payload)? },
            EventKind::FileRequested => Self::FileRequested {
                id: decode_transfer_id(payload)?,
                path: payload.opt_str("path")?.map(str::to_owned),
                total_bytes: payload.opt_u64("total_bytes")?,
                member: payload.opt_u64("member")?,
            },
            EventKind::TransferSendProgress => Self::TransferProgress {
                direction: Direction::Upload,
                id: decode_transfer_id(payload)?,
                progress: decode_progress(payload)?,
            },
            EventKind::TransferReceiveProgress => Self::TransferProgress {
                direction: Direction::Download,
                id: decode_transfer_id(payload)?,
                progress: decode_progress(payload)?,
            },
            EventKind::TransferSendFinished => Self::TransferFinished {
                direction: Direction::Upload,
                id: decode_transfer_id(payload)?,
                valid: None,
            },
            EventKind::TransferReceiveFinished => Self::TransferFinished {
                direction: Direction::Download,
                id: decode_transfer_id(payload)?,
                valid: Some(payload.opt_bool("valid")?.unwrap_or(true)),
            },
            EventKind::TransferCancelled => {
                Self::TransferCancelled { id: decode_transfer_id(payload)? }
            },
            EventKind::ConnectionChanged => {
                Self::ConnectionChanged { connected: payload.bool("connected")? }
            },
            EventKind::DataReceived => {
                let peer =
                    payload.opt_map("peer")?.ok_or(PayloadError::MissingField { field: "peer" })?;
                Self::DataReceived {
                    from: decode_peer_id(peer)?,
                    service: peer.opt_str("service")?.map(str::to_owned),
                    channel: payload.opt_u32("channel")?.unwrap_or(0),
                    data: payload.opt_map("data")?.cloned().unwrap_or_default(),
                }
            },
            EventKind::Error => Self::Error(TransportFailure {
                message: payload.str("message")?.to_owned(),
                code: payload.opt_i64("code")?,
            }),
        };
        Ok(event)
    }
}

fn decode_lobby(payload: &Payload) -> Result<Lobby, PayloadError> {
    let mut lobby = Lobby::new(payload.u64("id")?, payload.str("name")?);
    lobby.owner_id = payload.opt_u64("owner_id")?;
    lobby.max_players = payload.opt_u32("max_players")?;

    for (index, item) in payload.list_or_empty("members")?.iter().enumerate() {
        let entry = item
            .as_payload()
            .ok_or(PayloadError::WrongType { field: "members", expected: "map" })
            .and_then(decode_member)
            .map_err(|e| e.within("members", index))?;
        lobby.members.insert(entry.id, entry);
    }

    if let Some(data) = payload.opt_map("data")? {
        for (key, value) in data {
            match value {
                Value::Null => {},
                Value::Text(text) => {
                    lobby.data.insert(key.clone(), text.clone());
                },
                _ => return Err(PayloadError::WrongType { field: "data", expected: "map of text" }),
            }
        }
    }

    Ok(lobby)
}

fn decode_member(payload: &Payload) -> Result<Member, PayloadError> {
    let mut member = Member::new(payload.u64("id")?, payload.str("name")?);
    if let Some(data) = payload.opt_map("data")? {
        member.data = data
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<BTreeMap<_, _>>();
    }
    Ok(member)
}

fn decode_summary(payload: &Payload) -> Result<LobbySummary, PayloadError> {
    Ok(LobbySummary {
        id: payload.u64("id")?,
        name: payload.str("name")?.to_owned(),
        max_players: payload.opt_u32("max_players")?,
        player_count: payload.opt_u32("player_count")?,
    })
}

/// Transfer ids are text, but some transports number them. Either is
/// accepted and normalized to text.
fn decode_transfer_id(payload: &Payload) -> Result<TransferId, PayloadError> {
    match payload.get("id") {
        Some(Value::Text(id)) => Ok(id.clone()),
        Some(Value::Int(_)) => payload.u64("id").map(|id| id.to_string()),
        Some(Value::Null) | None => Err(PayloadError::MissingField { field: "id" }),
        Some(_) => Err(PayloadError::WrongType { field: "id", expected: "text or int" }),
    }
}

fn decode_file(payload: &Payload, self_id: Option<MemberId>) -> Result<FileTransfer, PayloadError> {
    let id = decode_transfer_id(payload)?;
    let path = payload.str("path")?;
    let total_bytes = payload.u64("total_bytes")?;
    let member = payload.opt_u64("member")?;

    let direction = match payload.opt_str("direction")? {
        Some(name) => Direction::from_name(name).ok_or(PayloadError::WrongType {
            field: "direction",
            expected: "upload or download",
        })?,
        None if member.is_none() || member == self_id => Direction::Upload,
        None => Direction::Download,
    };

    let mut transfer = FileTransfer::requested(id, direction, path);
    transfer.total_bytes = Some(total_bytes);
    transfer.member = member;
    Ok(transfer)
}

/// Peer ids travel as decimal text on some transports.
fn decode_peer_id(peer: &Payload) -> Result<MemberId, PayloadError> {
    let wrong = PayloadError::WrongType { field: "peer", expected: "member id as int or text" };
    match peer.get("id") {
        Some(Value::Text(id)) => id.parse().map_err(|_| wrong),
        Some(Value::Null) | None => Err(PayloadError::MissingField { field: "peer" }),
        Some(_) => peer.u64("id").map_err(|_| wrong),
    }
}

fn decode_progress(payload: &Payload) -> Result<Progress, PayloadError> {
    if let Some(bytes) = payload.opt_u64("transferred_bytes")? {
        return Ok(Progress::Bytes(bytes));
    }
    match payload.opt_f64("percentage")? {
        Some(percent) if (0.0..=100.0).contains(&percent) => Ok(Progress::Percent(percent)),
        Some(_) => {
            Err(PayloadError::WrongType { field: "percentage", expected: "number in 0..=100" })
        },
        None => Err(PayloadError::MissingField { field: "transferred_bytes" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_joined_decodes_roster_and_data() {
        let payload = Payload::new()
            .with("id", 2u64)
            .with("name", "B")
            .with("owner_id", 10u64)
            .with("self_id", 11u64)
            .with(
                "members",
                Value::List(vec![
                    Value::Map(Payload::new().with("id", 10u64).with("name", "host")),
                    Value::Map(
                        Payload::new()
                            .with("id", 11u64)
                            .with("name", "me")
                            .with("data", Payload::new().with("team", "red")),
                    ),
                ]),
            )
            .with("data", Payload::new().with("map", "dust"));

        let event = LobbyEvent::decode(EventKind::SelfJoined, &payload, None).expect("decode");
        let LobbyEvent::SelfJoined { lobby, self_id } = event else {
            unreachable!("decoded wrong variant");
        };
        assert_eq!(self_id, Some(11));
        assert_eq!(lobby.member_count(), 2);
        assert_eq!(lobby.owner_id, Some(10));
        assert_eq!(lobby.data.get("map").map(String::as_str), Some("dust"));
        assert_eq!(
            lobby.member(11).and_then(|m| m.data.get("team")),
            Some(&Value::Text("red".into()))
        );
    }

    #[test]
    fn bad_member_is_reported_with_index() {
        let payload = Payload::new().with("id", 2u64).with("name", "B").with(
            "members",
            Value::List(vec![
                Value::Map(Payload::new().with("id", 10u64).with("name", "host")),
                Value::Map(Payload::new().with("name", "no id")),
            ]),
        );
        let err = LobbyEvent::decode(EventKind::SelfJoined, &payload, None).unwrap_err();
        assert_eq!(err, PayloadError::MissingField { field: "id" }.within("members", 1));
    }

    #[test]
    fn progress_needs_bytes_or_percentage() {
        let payload = Payload::new().with("id", "f1");
        let err =
            LobbyEvent::decode(EventKind::TransferSendProgress, &payload, None).unwrap_err();
        assert_eq!(err, PayloadError::MissingField { field: "transferred_bytes" });

        let payload = Payload::new().with("id", "f1").with("percentage", 120.0);
        assert!(LobbyEvent::decode(EventKind::TransferSendProgress, &payload, None).is_err());
    }

    #[test]
    fn numeric_transfer_ids_become_text() {
        let payload = Payload::new().with("id", 42u64).with("transferred_bytes", 5u64);
        let event =
            LobbyEvent::decode(EventKind::TransferReceiveProgress, &payload, None).expect("decode");
        assert_eq!(
            event,
            LobbyEvent::TransferProgress {
                direction: Direction::Download,
                id: "42".into(),
                progress: Progress::Bytes(5),
            }
        );
        assert_eq!(event.kind(), EventKind::TransferReceiveProgress);
    }

    #[test]
    fn file_added_direction_defaults_from_member() {
        let base = Payload::new().with("id", "f1").with("path", "a.txt").with("total_bytes", 9u64);

        let own = LobbyEvent::decode(EventKind::FileAdded, &base, Some(3)).expect("decode");
        let LobbyEvent::FileAdded { transfer } = own else { unreachable!() };
        assert_eq!(transfer.direction, Direction::Upload);

        let theirs = base.clone().with("member", 4u64);
        let event = LobbyEvent::decode(EventKind::FileAdded, &theirs, Some(3)).expect("decode");
        let LobbyEvent::FileAdded { transfer } = event else { unreachable!() };
        assert_eq!(transfer.direction, Direction::Download);

        let mine = base.with("member", 3u64);
        let event = LobbyEvent::decode(EventKind::FileAdded, &mine, Some(3)).expect("decode");
        let LobbyEvent::FileAdded { transfer } = event else { unreachable!() };
        assert_eq!(transfer.direction, Direction::Upload);
    }

    #[test]
    fn receive_finished_defaults_to_valid() {
        let payload = Payload::new().with("id", "f1");
        let event =
            LobbyEvent::decode(EventKind::TransferReceiveFinished, &payload, None).expect("decode");
        assert!(matches!(event, LobbyEvent::TransferFinished { valid: Some(true), .. }));
    }

    #[test]
    fn unknown_leave_reason_is_malformed() {
        let payload = Payload::new().with("reason", "teleported");
        assert!(matches!(
            LobbyEvent::decode(EventKind::SelfLeft, &payload, None),
            Err(PayloadError::WrongType { field: "reason", .. })
        ));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let payload = Payload::new().with("connected", true).with("latency_ms", 12u64);
        assert_eq!(
            LobbyEvent::decode(EventKind::ConnectionChanged, &payload, None),
            Ok(LobbyEvent::ConnectionChanged { connected: true })
        );
    }

    #[test]
    fn data_received_accepts_text_peer_ids() {
        let payload = Payload::new()
            .with("peer", Payload::new().with("id", "76561198000000001").with("service", "steam"))
            .with("channel", 2u64)
            .with("data", Payload::new().with("score", 12u64));

        let event = LobbyEvent::decode(EventKind::DataReceived, &payload, None).expect("decode");
        assert_eq!(
            event,
            LobbyEvent::DataReceived {
                from: 76_561_198_000_000_001,
                service: Some("steam".into()),
                channel: 2,
                data: Payload::new().with("score", 12u64),
            }
        );
        assert_eq!(event.kind(), EventKind::DataReceived);
    }

    #[test]
    fn data_received_defaults_channel_and_body() {
        let payload = Payload::new().with("peer", Payload::new().with("id", 6u64));
        assert_eq!(
            LobbyEvent::decode(EventKind::DataReceived, &payload, None),
            Ok(LobbyEvent::DataReceived {
                from: 6,
                service: None,
                channel: 0,
                data: Payload::new(),
            })
        );
    }

    #[test]
    fn data_received_needs_a_numeric_peer() {
        let missing = Payload::new().with("data", Payload::new());
        assert_eq!(
            LobbyEvent::decode(EventKind::DataReceived, &missing, None),
            Err(PayloadError::MissingField { field: "peer" })
        );

        let garbled = Payload::new().with("peer", Payload::new().with("id", "host"));
        assert!(matches!(
            LobbyEvent::decode(EventKind::DataReceived, &garbled, None),
            Err(PayloadError::WrongType { field: "peer", .. })
        ));
    }
}
