//! Event router.
//!
//! Folds inbound transport events into [`ClientState`]. Every mutation is keyed
//! by an explicit id (lobby, member, transfer) and checked against live state,
//! which is what makes the router tolerant of duplicated and interleaved
//! streams: an update for something that is no longer current is dropped
//! rather than applied to the wrong thing.

use lobbyframe_proto::{EventKind, Payload};

use crate::{
    ClientConfig, ClientState, Environment, IgnoreReason, LeaveReason, LobbyEvent, Outcome,
    SessionIdentity, session::replace_if_different,
};

/// Applies inbound events to the client state.
///
/// Single-threaded: the owner calls [`EventRouter::dispatch`] serially and
/// hands out `&ClientState` between calls.
pub struct EventRouter<E: Environment> {
    env: E,
    config: ClientConfig,
    state: ClientState<E::Instant>,
}

impl<E: Environment> EventRouter<E> {
    /// Create a router for a fresh session.
    pub fn new(env: E, identity: SessionIdentity, config: ClientConfig) -> Self {
        Self { env, config, state: ClientState::new(identity) }
    }

    /// Read-only view of everything the client knows.
    pub fn state(&self) -> &ClientState<E::Instant> {
        &self.state
    }

    /// Router configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Environment the router reads time from.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Decode and apply one untyped event.
    ///
    /// Unknown names and malformed payloads are ignored with a diagnostic;
    /// neither touches state.
    pub fn dispatch(&mut self, name: &str, payload: &Payload) -> Outcome {
        let Some(kind) = EventKind::from_name(name) else {
            let outcome = Outcome::Ignored(IgnoreReason::UnknownKind(name.to_owned()));
            trace_outcome(name, &outcome);
            return outcome;
        };

        match LobbyEvent::decode(kind, payload, self.state.session.self_id()) {
            Ok(event) => self.apply(event),
            Err(error) => {
                let outcome = Outcome::Ignored(IgnoreReason::Malformed(error));
                trace_outcome(kind.name(), &outcome);
                outcome
            },
        }
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: LobbyEvent) -> Outcome {
        let kind = event.kind();
        let outcome = self.apply_inner(event);
        trace_outcome(kind.name(), &outcome);
        outcome
    }

    /// Drop terminal transfers whose retention window has elapsed.
    ///
    /// Returns the number removed.
    pub fn sweep(&mut self) -> usize {
        let removed = self.state.transfers.sweep(self.env.now(), self.config.transfer_retention);
        if removed > 0 {
            tracing::debug!(removed, "swept expired transfers");
        }
        removed
    }

    fn apply_inner(&mut self, event: LobbyEvent) -> Outcome {
        let state = &mut self.state;
        match event {
            LobbyEvent::SelfJoined { lobby, self_id } => {
                let rejoin = state.lobby_id() == Some(lobby.id);
                let self_changed = match self_id {
                    Some(id) => state.session.set_self_id(id),
                    None if !rejoin => state.session.clear_self_id(),
                    None => false,
                };

                if let Some(current) = state.lobby.as_mut()
                    && current.id == lobby.id
                {
                    let changed = *current != lobby;
                    *current = lobby;
                    return Outcome::changed(changed || self_changed);
                }

                tracing::info!(lobby_id = lobby.id, name = %lobby.name, "joined lobby");
                state.lobby = Some(lobby);
                state.chat.clear();
                Outcome::Applied
            },
            LobbyEvent::SelfLeft { reason } => {
                let Some(lobby) = state.lobby.take() else {
                    return Outcome::Unchanged;
                };
                tracing::info!(
                    lobby_id = lobby.id,
                    reason = reason.map_or("unspecified", LeaveReason::name),
                    "left lobby"
                );
                state.session.clear_self_id();
                state.chat.clear();
                Outcome::Applied
            },
            LobbyEvent::PlayerJoined { member, lobby_id } => match state.scoped_lobby(lobby_id) {
                Ok(lobby) => lobby.upsert_member(member),
                Err(reason) => reason.into(),
            },
            LobbyEvent::PlayerLeft { member_id, lobby_id } => match state.scoped_lobby(lobby_id) {
                Ok(lobby) => lobby.remove_member(member_id),
                Err(reason) => reason.into(),
            },
            LobbyEvent::LobbyList { lobbies } => state.session.replace_lobby_list(lobbies),
            LobbyEvent::Chat { member, text, lobby_id } => {
                if let Err(reason) = state.scoped_lobby(lobby_id) {
                    return reason.into();
                }
                state.chat.append(member, text);
                Outcome::Applied
            },
            LobbyEvent::NameChanged { lobby_id, name } => match state.scoped_lobby(Some(lobby_id)) {
                Ok(lobby) => Outcome::changed(replace_if_different(&mut lobby.name, name)),
                Err(reason) => reason.into(),
            },
            LobbyEvent::MaxPlayersChanged { lobby_id, max_players } => {
                match state.scoped_lobby(Some(lobby_id)) {
                    Ok(lobby) => {
                        Outcome::changed(replace_if_different(&mut lobby.max_players, Some(max_players)))
                    },
                    Err(reason) => reason.into(),
                }
            },
            LobbyEvent::InfoFetched { id, name, max_players, player_count } => {
                state.session.update_listed(id, name, max_players, player_count)
            },
            LobbyEvent::Created { summary } => {
                tracing::info!(lobby_id = summary.id, name = %summary.name, "lobby created");
                state.session.record_created(summary)
            },
            LobbyEvent::LobbyDataChanged { lobby_id, key, value } => {
                match state.scoped_lobby(Some(lobby_id)) {
                    Ok(lobby) => lobby.set_data(key, value),
                    Err(reason) => reason.into(),
                }
            },
            LobbyEvent::MemberDataChanged { member_id, key, value, lobby_id } => {
                match state.scoped_lobby(lobby_id) {
                    Ok(lobby) => lobby.set_member_data(member_id, key, value),
                    Err(reason) => reason.into(),
                }
            },
            LobbyEvent::MemberNameChanged { member_id, name, lobby_id } => {
                match state.scoped_lobby(lobby_id) {
                    Ok(lobby) => lobby.rename_member(member_id, name),
                    Err(reason) => reason.into(),
                }
            },
            LobbyEvent::FileAdded { transfer } => state.transfers.insert(transfer),
            LobbyEvent::FileRemoved { id } => state.transfers.remove(&id),
            LobbyEvent::FileRequested { id, path, total_bytes, member } => {
                state.transfers.note_request(id, path, total_bytes, member)
            },
            LobbyEvent::TransferProgress { id, progress, .. } => {
                state.transfers.progress(&id, progress)
            },
            LobbyEvent::TransferFinished { id, valid, .. } => {
                state.transfers.finish(&id, valid, self.env.now())
            },
            LobbyEvent::TransferCancelled { id } => state.transfers.cancel(&id, self.env.now()),
            LobbyEvent::ConnectionChanged { connected } => {
                let outcome = state.session.set_connected(connected);
                if outcome.is_applied() {
                    tracing::info!(connected, "connection changed");
                }
                outcome
            },
            LobbyEvent::DataReceived { from, channel, data, .. } => {
                if let Err(reason) = state.scoped_lobby(None) {
                    return reason.into();
                }
                tracing::trace!(from, channel, fields = data.len(), "peer data received");
                Outcome::Applied
            },
            LobbyEvent::Error(failure) => {
                tracing::warn!(code = ?failure.code, message = %failure.message, "transport error");
                state.session.record_error(failure);
                Outcome::Applied
            },
        }
    }
}

fn trace_outcome(kind: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Applied | Outcome::Unchanged => {
            tracing::trace!(kind, ?outcome, "event handled");
        },
        Outcome::Ignored(reason @ IgnoreReason::Malformed(_)) => {
            tracing::warn!(kind, %reason, "dropping event");
        },
        Outcome::Ignored(reason) => {
            tracing::debug!(kind, %reason, "ignoring event");
        },
    }
}
