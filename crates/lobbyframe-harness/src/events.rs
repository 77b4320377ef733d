//! Event builders.
//!
//! Shorthand for the `(name, payload)` records a transport would deliver.

use lobbyframe_proto::{EventKind, EventRecord, Payload, Value};

fn record(kind: EventKind, payload: Payload) -> EventRecord {
    EventRecord::new(kind.name(), payload)
}

/// `self_joined` with no roster.
pub fn self_joined(id: u64, name: &str) -> EventRecord {
    record(EventKind::SelfJoined, Payload::new().with("id", id).with("name", name))
}

/// `self_joined` with a roster of `(id, name)` pairs, owner and self id.
pub fn self_joined_with(
    id: u64,
    name: &str,
    owner_id: u64,
    self_id: u64,
    members: &[(u64, &str)],
) -> EventRecord {
    let roster: Vec<Value> = members
        .iter()
        .map(|(id, name)| Value::Map(Payload::new().with("id", *id).with("name", *name)))
        .collect();
    record(
        EventKind::SelfJoined,
        Payload::new()
            .with("id", id)
            .with("name", name)
            .with("owner_id", owner_id)
            .with("self_id", self_id)
            .with("members", roster),
    )
}

/// `self_left` without a reason.
pub fn self_left() -> EventRecord {
    record(EventKind::SelfLeft, Payload::new())
}

/// `player_joined`, optionally tagged with a lobby id.
pub fn player_joined(member: u64, name: &str, lobby_id: Option<u64>) -> EventRecord {
    record(
        EventKind::PlayerJoined,
        Payload::new().with("id", member).with("name", name).with("lobby_id", lobby_id),
    )
}

/// `player_left`.
pub fn player_left(member: u64) -> EventRecord {
    record(EventKind::PlayerLeft, Payload::new().with("id", member))
}

/// `lobby_list` of `(id, name)` pairs.
pub fn lobby_list(lobbies: &[(u64, &str)]) -> EventRecord {
    let entries: Vec<Value> = lobbies
        .iter()
        .map(|(id, name)| Value::Map(Payload::new().with("id", *id).with("name", *name)))
        .collect();
    record(EventKind::LobbyList, Payload::new().with("lobbies", entries))
}

/// `chat`. `member: None` is a system message.
pub fn chat(member: Option<u64>, text: &str) -> EventRecord {
    record(EventKind::Chat, Payload::new().with("member", member).with("text", text))
}

/// `max_players_changed`.
pub fn max_players_changed(lobby_id: u64, max_players: u32) -> EventRecord {
    record(
        EventKind::MaxPlayersChanged,
        Payload::new().with("lobby_id", lobby_id).with("max_players", max_players),
    )
}

/// `file_added` with a known size.
pub fn file_added(id: &str, path: &str, total_bytes: u64) -> EventRecord {
    record(
        EventKind::FileAdded,
        Payload::new().with("id", id).with("path", path).with("total_bytes", total_bytes),
    )
}

/// `file_added` for a file another member shares, i.e. a download.
pub fn file_shared_by(member: u64, id: &str, path: &str, total_bytes: u64) -> EventRecord {
    record(
        EventKind::FileAdded,
        Payload::new()
            .with("id", id)
            .with("path", path)
            .with("total_bytes", total_bytes)
            .with("member", member),
    )
}

/// `file_removed`.
pub fn file_removed(id: &str) -> EventRecord {
    record(EventKind::FileRemoved, Payload::new().with("id", id))
}

/// `transfer_send_progress` in bytes.
pub fn send_progress(id: &str, transferred_bytes: u64) -> EventRecord {
    record(
        EventKind::TransferSendProgress,
        Payload::new().with("id", id).with("transferred_bytes", transferred_bytes),
    )
}

/// `transfer_receive_progress` as a percentage.
pub fn receive_percent(id: &str, percentage: f64) -> EventRecord {
    record(
        EventKind::TransferReceiveProgress,
        Payload::new().with("id", id).with("percentage", percentage),
    )
}

/// `transfer_send_finished`.
pub fn send_finished(id: &str) -> EventRecord {
    record(EventKind::TransferSendFinished, Payload::new().with("id", id))
}

/// `transfer_receive_finished` with an integrity flag.
pub fn receive_finished(id: &str, valid: bool) -> EventRecord {
    record(EventKind::TransferReceiveFinished, Payload::new().with("id", id).with("valid", valid))
}

/// `transfer_cancelled`.
pub fn transfer_cancelled(id: &str) -> EventRecord {
    record(EventKind::TransferCancelled, Payload::new().with("id", id))
}

/// `connection_changed`.
pub fn connection_changed(connected: bool) -> EventRecord {
    record(EventKind::ConnectionChanged, Payload::new().with("connected", connected))
}

/// `data_received` from `member` on `channel`.
pub fn data_received(member: u64, channel: u32, data: Payload) -> EventRecord {
    record(
        EventKind::DataReceived,
        Payload::new()
            .with("peer", Payload::new().with("id", member.to_string()))
            .with("channel", channel)
            .with("data", data),
    )
}
