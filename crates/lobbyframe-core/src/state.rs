//! The state container the router owns.

use crate::{
    ChatLog, IgnoreReason, Lobby, LobbyId, Session, SessionIdentity, StaleRef, TransferRegistry,
};

/// Everything the client knows.
///
/// Owned by the [`crate::EventRouter`]; everyone else gets `&ClientState`.
#[derive(Debug, Clone)]
pub struct ClientState<I> {
    pub(crate) session: Session,
    pub(crate) lobby: Option<Lobby>,
    pub(crate) chat: ChatLog,
    pub(crate) transfers: TransferRegistry<I>,
}

impl<I> ClientState<I> {
    /// Fresh state: no lobby, empty chat, no transfers.
    pub fn new(identity: SessionIdentity) -> Self {
        Self {
            session: Session::new(identity),
            lobby: None,
            chat: ChatLog::new(),
            transfers: TransferRegistry::new(),
        }
    }

    /// Session facts.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current lobby.
    pub fn lobby(&self) -> Option<&Lobby> {
        self.lobby.as_ref()
    }

    /// Chat log of the current lobby.
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// File transfers.
    pub fn transfers(&self) -> &TransferRegistry<I> {
        &self.transfers
    }

    /// Id of the current lobby.
    pub fn lobby_id(&self) -> Option<LobbyId> {
        self.lobby.as_ref().map(|lobby| lobby.id)
    }

    /// Whether we own the current lobby.
    pub fn is_host(&self) -> bool {
        match (&self.lobby, self.session.self_id()) {
            (Some(lobby), Some(self_id)) => lobby.is_owner(self_id),
            _ => false,
        }
    }

    /// Current lobby, checked against the lobby an event names.
    ///
    /// `None` accepts any current lobby.
    pub(crate) fn scoped_lobby(
        &mut self,
        lobby_id: Option<LobbyId>,
    ) -> Result<&mut Lobby, IgnoreReason> {
        let lobby = self.lobby.as_mut().ok_or(IgnoreReason::NotInLobby)?;
        match lobby_id {
            Some(event) if event != lobby.id => {
                Err(IgnoreReason::Stale(StaleRef::Lobby { event, current: lobby.id }))
            },
            _ => Ok(lobby),
        }
    }
}
