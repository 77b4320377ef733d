//! Current lobby: roster and metadata.

use std::collections::BTreeMap;

use lobbyframe_proto::Value;

use crate::{IgnoreReason, LobbyId, MemberId, Outcome, StaleRef, session::replace_if_different};

/// A lobby member.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Transport peer id.
    pub id: MemberId,
    /// Display name.
    pub name: String,
    /// Per-member metadata.
    pub data: BTreeMap<String, Value>,
}

impl Member {
    /// Member with no metadata.
    pub fn new(id: MemberId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), data: BTreeMap::new() }
    }
}

/// The lobby the session is currently in.
///
/// Built wholesale from a `self_joined` snapshot, then patched field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct Lobby {
    /// Lobby id.
    pub id: LobbyId,
    /// Display name.
    pub name: String,
    /// Host member, if known.
    pub owner_id: Option<MemberId>,
    /// Capacity, if known.
    pub max_players: Option<u32>,
    /// Roster keyed by member id.
    pub members: BTreeMap<MemberId, Member>,
    /// Lobby-level metadata.
    pub data: BTreeMap<String, String>,
}

impl Lobby {
    /// Lobby with an empty roster.
    pub fn new(id: LobbyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id: None,
            max_players: None,
            members: BTreeMap::new(),
            data: BTreeMap::new(),
        }
    }

    /// Look up a member.
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    /// Whether `id` is in the roster.
    pub fn has_member(&self, id: MemberId) -> bool {
        self.members.contains_key(&id)
    }

    /// Number of members in the roster.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether `id` is the lobby host.
    pub fn is_owner(&self, id: MemberId) -> bool {
        self.owner_id == Some(id)
    }

    pub(crate) fn upsert_member(&mut self, member: Member) -> Outcome {
        match self.members.get_mut(&member.id) {
            Some(existing) => Outcome::changed(replace_if_different(existing, member)),
            None => {
                self.members.insert(member.id, member);
                Outcome::Applied
            },
        }
    }

    pub(crate) fn remove_member(&mut self, id: MemberId) -> Outcome {
        match self.members.remove(&id) {
            Some(_) => Outcome::Applied,
            None => IgnoreReason::Stale(StaleRef::Member(id)).into(),
        }
    }

    pub(crate) fn rename_member(&mut self, id: MemberId, name: String) -> Outcome {
        match self.members.get_mut(&id) {
            Some(member) => Outcome::changed(replace_if_different(&mut member.name, name)),
            None => IgnoreReason::Stale(StaleRef::Member(id)).into(),
        }
    }

    /// `None` removes the key.
    pub(crate) fn set_member_data(
        &mut self,
        id: MemberId,
        key: String,
        value: Option<Value>,
    ) -> Outcome {
        let Some(member) = self.members.get_mut(&id) else {
            return IgnoreReason::Stale(StaleRef::Member(id)).into();
        };
        Outcome::changed(set_or_remove(&mut member.data, key, value))
    }

    /// `None` removes the key.
    pub(crate) fn set_data(&mut self, key: String, value: Option<String>) -> Outcome {
        Outcome::changed(set_or_remove(&mut self.data, key, value))
    }
}

fn set_or_remove<V: PartialEq>(map: &mut BTreeMap<String, V>, key: String, value: Option<V>) -> bool {
    match value {
        Some(value) => {
            if map.get(&key) == Some(&value) {
                return false;
            }
            map.insert(key, value);
            true
        },
        None => map.remove(&key).is_some(),
    }
}
