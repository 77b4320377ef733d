//! Session-level facts that outlive any single lobby.

use crate::{IgnoreReason, LobbyId, MemberId, Outcome, StaleRef};

/// Identity the transport hands over at startup. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Local display name.
    pub user_name: String,
    /// Local network address, as the transport reports it.
    pub local_address: String,
}

impl SessionIdentity {
    /// Create an identity.
    pub fn new(user_name: impl Into<String>, local_address: impl Into<String>) -> Self {
        Self { user_name: user_name.into(), local_address: local_address.into() }
    }
}

/// One entry of the discoverable-lobby list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySummary {
    /// Lobby id.
    pub id: LobbyId,
    /// Display name.
    pub name: String,
    /// Capacity, if the transport reported it.
    pub max_players: Option<u32>,
    /// Current occupancy, if the transport reported it.
    pub player_count: Option<u32>,
}

impl LobbySummary {
    /// Summary with only id and name known.
    pub fn new(id: LobbyId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), max_players: None, player_count: None }
    }
}

/// A failure the transport reported asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Human-readable message.
    pub message: String,
    /// Transport-specific code, if any.
    pub code: Option<i64>,
}

/// Identity and connectivity, independent of lobby membership.
#[derive(Debug, Clone)]
pub struct Session {
    identity: SessionIdentity,
    connected: bool,
    self_id: Option<MemberId>,
    last_error: Option<TransportFailure>,
    lobby_list: Vec<LobbySummary>,
    last_created: Option<LobbySummary>,
}

impl Session {
    /// Fresh session: disconnected, no lobby list, no errors.
    pub fn new(identity: SessionIdentity) -> Self {
        Self {
            identity,
            connected: false,
            self_id: None,
            last_error: None,
            lobby_list: Vec::new(),
            last_created: None,
        }
    }

    /// Startup identity.
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Local display name.
    pub fn user_name(&self) -> &str {
        &self.identity.user_name
    }

    /// Local network address.
    pub fn local_address(&self) -> &str {
        &self.identity.local_address
    }

    /// Whether the transport last reported itself connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Our member id, once a lobby join has reported it.
    pub fn self_id(&self) -> Option<MemberId> {
        self.self_id
    }

    /// Most recent transport-reported failure.
    pub fn last_error(&self) -> Option<&TransportFailure> {
        self.last_error.as_ref()
    }

    /// Cached result of the last lobby discovery query.
    pub fn lobby_list(&self) -> &[LobbySummary] {
        &self.lobby_list
    }

    /// Cached entry for `id`, if listed.
    pub fn listed(&self, id: LobbyId) -> Option<&LobbySummary> {
        self.lobby_list.iter().find(|summary| summary.id == id)
    }

    /// Last lobby this client created.
    pub fn last_created(&self) -> Option<&LobbySummary> {
        self.last_created.as_ref()
    }

    pub(crate) fn set_connected(&mut self, connected: bool) -> Outcome {
        let changed = self.connected != connected;
        self.connected = connected;
        Outcome::changed(changed)
    }

    pub(crate) fn set_self_id(&mut self, self_id: MemberId) -> bool {
        self.self_id.replace(self_id) != Some(self_id)
    }

    /// Member ids are per lobby; forget ours once it no longer applies.
    pub(crate) fn clear_self_id(&mut self) -> bool {
        self.self_id.take().is_some()
    }

    pub(crate) fn replace_lobby_list(&mut self, lobbies: Vec<LobbySummary>) -> Outcome {
        if self.lobby_list == lobbies {
            return Outcome::Unchanged;
        }
        self.lobby_list = lobbies;
        Outcome::Applied
    }

    /// Merge fetched details into the listed entry. Absent fields keep their
    /// cached values.
    pub(crate) fn update_listed(
        &mut self,
        id: LobbyId,
        name: Option<String>,
        max_players: Option<u32>,
        player_count: Option<u32>,
    ) -> Outcome {
        let Some(entry) = self.lobby_list.iter_mut().find(|summary| summary.id == id) else {
            return Outcome::Ignored(IgnoreReason::Stale(StaleRef::ListedLobby(id)));
        };

        let mut changed = false;
        if let Some(name) = name {
            changed |= replace_if_different(&mut entry.name, name);
        }
        if max_players.is_some() {
            changed |= replace_if_different(&mut entry.max_players, max_players);
        }
        if player_count.is_some() {
            changed |= replace_if_different(&mut entry.player_count, player_count);
        }
        Outcome::changed(changed)
    }

    pub(crate) fn record_created(&mut self, summary: LobbySummary) -> Outcome {
        let changed = self.last_created.as_ref() != Some(&summary);
        self.last_created = Some(summary);
        Outcome::changed(changed)
    }

    pub(crate) fn record_error(&mut self, failure: TransportFailure) {
        self.last_error = Some(failure);
    }
}

pub(crate) fn replace_if_different<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SessionIdentity::new("ash", "10.0.0.2:4000"))
    }

    #[test]
    fn new_session_is_disconnected_and_empty() {
        let s = session();
        assert_eq!(s.user_name(), "ash");
        assert_eq!(s.local_address(), "10.0.0.2:4000");
        assert!(!s.is_connected());
        assert!(s.lobby_list().is_empty());
        assert_eq!(s.self_id(), None);
    }

    #[test]
    fn update_listed_merges_present_fields() {
        let mut s = session();
        s.replace_lobby_list(vec![LobbySummary::new(1, "A")]);

        assert_eq!(s.update_listed(1, None, Some(8), None), Outcome::Applied);
        assert_eq!(s.update_listed(1, Some("A".into()), Some(8), None), Outcome::Unchanged);

        let entry = s.listed(1).expect("listed");
        assert_eq!(entry.name, "A");
        assert_eq!(entry.max_players, Some(8));
        assert_eq!(entry.player_count, None);
    }

    #[test]
    fn update_listed_unknown_is_stale() {
        let mut s = session();
        assert_eq!(
            s.update_listed(9, None, None, None),
            Outcome::Ignored(IgnoreReason::Stale(StaleRef::ListedLobby(9)))
        );
    }
}
