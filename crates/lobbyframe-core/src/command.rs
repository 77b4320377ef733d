//! Outbound commands.
//!
//! The [`CommandGateway`] checks each intent against a read-only view of the
//! state and, if it passes, hands a [`Command`] to the [`Transport`]. A
//! successful return only means the command was accepted locally; the remote
//! outcome arrives later as an event.

use lobbyframe_proto::Payload;

use crate::{
    ClientState, CommandError, Direction, FileTransfer, LobbyId, MemberId, TransferId,
    TransportError,
};

/// Lobby visibility for `create_lobby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Privacy {
    /// Listed in discovery.
    #[default]
    Public,
    /// Visible to friends of members only.
    FriendsOnly,
    /// Join by id or direct address only.
    Private,
}

/// Delivery guarantee for member data messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reliability {
    /// Delivered in order, retransmitted on loss.
    #[default]
    Reliable,
    /// Best effort.
    Unreliable,
}

/// How a data message travels: transport channel and reliability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Delivery {
    /// Transport channel, 0 unless the application splits traffic.
    pub channel: u32,
    /// Delivery guarantee.
    pub reliability: Reliability,
}

impl Delivery {
    /// Reliable delivery on `channel`.
    pub const fn reliable(channel: u32) -> Self {
        Self { channel, reliability: Reliability::Reliable }
    }

    /// Best-effort delivery on `channel`.
    pub const fn unreliable(channel: u32) -> Self {
        Self { channel, reliability: Reliability::Unreliable }
    }
}

/// A validated outbound command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Query discoverable lobbies.
    ListLobbies,
    /// Join a lobby by id.
    JoinLobby {
        /// Lobby to join.
        lobby_id: LobbyId,
    },
    /// Leave the current lobby.
    LeaveLobby,
    /// Send a chat line to the current lobby.
    SendChat {
        /// Message text, as typed.
        text: String,
    },
    /// Start downloading a shared file.
    RequestFile {
        /// Transfer to start.
        id: TransferId,
    },
    /// Abort a transfer.
    CancelTransfer {
        /// Transfer to abort.
        id: TransferId,
    },
    /// Create and host a new lobby.
    CreateLobby {
        /// Display name.
        name: String,
        /// Capacity.
        max_players: u32,
        /// Visibility.
        privacy: Privacy,
    },
    /// Join a lobby hosted at a known address.
    DirectConnect {
        /// Host address.
        address: String,
    },
    /// Refresh details of a listed lobby.
    FetchLobbyInfo {
        /// Listed lobby.
        lobby_id: LobbyId,
    },
    /// Rename the current lobby.
    SetLobbyName {
        /// Current lobby.
        lobby_id: LobbyId,
        /// New name.
        name: String,
    },
    /// Set a lobby metadata key.
    SetLobbyData {
        /// Current lobby.
        lobby_id: LobbyId,
        /// Metadata key.
        key: String,
        /// New value.
        value: String,
    },
    /// Remove a lobby metadata key.
    RemoveLobbyData {
        /// Current lobby.
        lobby_id: LobbyId,
        /// Metadata key.
        key: String,
    },
    /// Remove a member from the current lobby.
    KickMember {
        /// Current lobby.
        lobby_id: LobbyId,
        /// Member to remove.
        member_id: MemberId,
    },
    /// Share a local file into the current lobby.
    AddFile {
        /// Local path.
        path: String,
    },
    /// Send a data message to the lobby host.
    SendToHost {
        /// Current lobby.
        lobby_id: LobbyId,
        /// Owner of that lobby.
        host_id: MemberId,
        /// Message body.
        body: Payload,
        /// Channel and reliability.
        delivery: Delivery,
    },
    /// Send a data message to one member. Host only.
    SendTo {
        /// Current lobby.
        lobby_id: LobbyId,
        /// Recipient.
        member_id: MemberId,
        /// Message body.
        body: Payload,
        /// Channel and reliability.
        delivery: Delivery,
    },
    /// Send a data message to every other member. Host only.
    SendToMembers {
        /// Current lobby.
        lobby_id: LobbyId,
        /// Message body.
        body: Payload,
        /// Channel and reliability.
        delivery: Delivery,
    },
}

impl Command {
    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ListLobbies => "list_lobbies",
            Self::JoinLobby { .. } => "join_lobby",
            Self::LeaveLobby => "leave_lobby",
            Self::SendChat { .. } => "send_chat",
            Self::RequestFile { .. } => "request_file",
            Self::CancelTransfer { .. } => "cancel_transfer",
            Self::CreateLobby { .. } => "create_lobby",
            Self::DirectConnect { .. } => "direct_connect",
            Self::FetchLobbyInfo { .. } => "fetch_lobby_info",
            Self::SetLobbyName { .. } => "set_lobby_name",
            Self::SetLobbyData { .. } => "set_lobby_data",
            Self::RemoveLobbyData { .. } => "remove_lobby_data",
            Self::KickMember { .. } => "kick_member",
            Self::AddFile { .. } => "add_file",
            Self::SendToHost { .. } => "send_to_host",
            Self::SendTo { .. } => "send_to",
            Self::SendToMembers { .. } => "send_to_members",
        }
    }
}

/// Outbound half of the session transport.
///
/// `submit` must not block and must not call back into the client. Results
/// come back as inbound events.
pub trait Transport {
    /// Hand a command to the transport.
    fn submit(&mut self, command: Command) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn submit(&mut self, command: Command) -> Result<(), TransportError> {
        (**self).submit(command)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn submit(&mut self, command: Command) -> Result<(), TransportError> {
        (**self).submit(command)
    }
}

/// Validates intents against the current state and forwards them.
///
/// Borrows the state immutably, so it cannot change anything the router owns.
pub struct CommandGateway<'a, I, T: Transport + ?Sized> {
    state: &'a ClientState<I>,
    transport: &'a mut T,
}

impl<'a, I, T: Transport + ?Sized> CommandGateway<'a, I, T> {
    /// Gateway over a state snapshot and a transport.
    pub fn new(state: &'a ClientState<I>, transport: &'a mut T) -> Self {
        Self { state, transport }
    }

    /// Ask for the discoverable-lobby list.
    pub fn list_lobbies(&mut self) -> Result<(), CommandError> {
        self.submit(Command::ListLobbies)
    }

    /// Join a lobby by id.
    pub fn join_lobby(&mut self, lobby_id: LobbyId) -> Result<(), CommandError> {
        self.require_no_lobby()?;
        self.submit(Command::JoinLobby { lobby_id })
    }

    /// Leave the current lobby.
    pub fn leave_lobby(&mut self) -> Result<(), CommandError> {
        self.require_lobby()?;
        self.submit(Command::LeaveLobby)
    }

    /// Send a chat line. Blank text is refused.
    pub fn send_chat(&mut self, text: &str) -> Result<(), CommandError> {
        self.require_lobby()?;
        if text.trim().is_empty() {
            return Err(CommandError::EmptyMessage);
        }
        self.submit(Command::SendChat { text: text.to_owned() })
    }

    /// Start downloading a shared file.
    ///
    /// Only another member's file can be requested; our own shares are
    /// uploads and start when someone else asks for them.
    pub fn request_file(&mut self, id: &str) -> Result<(), CommandError> {
        self.require_lobby()?;
        if self.require_live_transfer(id)?.direction == Direction::Upload {
            return Err(CommandError::InvalidArgument {
                field: "id",
                reason: "own shared files cannot be requested",
            });
        }
        self.submit(Command::RequestFile { id: id.to_owned() })
    }

    /// Abort a transfer. Advisory: the transfer may still finish.
    pub fn cancel_transfer(&mut self, id: &str) -> Result<(), CommandError> {
        self.require_live_transfer(id)?;
        self.submit(Command::CancelTransfer { id: id.to_owned() })
    }

    /// Create and host a new lobby.
    pub fn create_lobby(
        &mut self,
        name: &str,
        max_players: u32,
        privacy: Privacy,
    ) -> Result<(), CommandError> {
        self.require_no_lobby()?;
        require_text("name", name)?;
        if max_players == 0 {
            return Err(CommandError::InvalidArgument {
                field: "max_players",
                reason: "must be at least 1",
            });
        }
        self.submit(Command::CreateLobby { name: name.to_owned(), max_players, privacy })
    }

    /// Join a lobby hosted at a known address.
    pub fn direct_connect(&mut self, address: &str) -> Result<(), CommandError> {
        self.require_no_lobby()?;
        require_text("address", address)?;
        self.submit(Command::DirectConnect { address: address.trim().to_owned() })
    }

    /// Refresh details of a listed lobby.
    pub fn fetch_lobby_info(&mut self, lobby_id: LobbyId) -> Result<(), CommandError> {
        self.submit(Command::FetchLobbyInfo { lobby_id })
    }

    /// Rename the current lobby.
    pub fn set_lobby_name(&mut self, name: &str) -> Result<(), CommandError> {
        let lobby_id = self.require_lobby()?;
        require_text("name", name)?;
        self.submit(Command::SetLobbyName { lobby_id, name: name.to_owned() })
    }

    /// Set a lobby metadata key. Host only.
    pub fn set_lobby_data(&mut self, key: &str, value: &str) -> Result<(), CommandError> {
        let lobby_id = self.require_host("set lobby data")?;
        self.submit(Command::SetLobbyData {
            lobby_id,
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Remove a lobby metadata key. Host only.
    pub fn remove_lobby_data(&mut self, key: &str) -> Result<(), CommandError> {
        let lobby_id = self.require_host("remove lobby data")?;
        self.submit(Command::RemoveLobbyData { lobby_id, key: key.to_owned() })
    }

    /// Remove a member from the current lobby.
    pub fn kick_member(&mut self, member_id: MemberId) -> Result<(), CommandError> {
        let lobby_id = self.require_lobby()?;
        if self.state.session().self_id() == Some(member_id) {
            return Err(CommandError::CannotKickSelf);
        }
        if !self.state.lobby().is_some_and(|lobby| lobby.has_member(member_id)) {
            return Err(CommandError::UnknownMember { member_id });
        }
        self.submit(Command::KickMember { lobby_id, member_id })
    }

    /// Share a local file into the current lobby.
    pub fn add_file(&mut self, path: &str) -> Result<(), CommandError> {
        self.require_lobby()?;
        require_text("path", path)?;
        self.submit(Command::AddFile { path: path.to_owned() })
    }

    /// Send a data message to the lobby host.
    pub fn send_to_host(&mut self, body: Payload, delivery: Delivery) -> Result<(), CommandError> {
        let lobby_id = self.require_lobby()?;
        let host_id = self
            .state
            .lobby()
            .and_then(|lobby| lobby.owner_id)
            .ok_or(CommandError::NoHost { lobby_id })?;
        self.submit(Command::SendToHost { lobby_id, host_id, body, delivery })
    }

    /// Send a data message to one member. Host only.
    pub fn send_to(
        &mut self,
        member_id: MemberId,
        body: Payload,
        delivery: Delivery,
    ) -> Result<(), CommandError> {
        let lobby_id = self.require_host("send to a member")?;
        if !self.state.lobby().is_some_and(|lobby| lobby.has_member(member_id)) {
            return Err(CommandError::UnknownMember { member_id });
        }
        self.submit(Command::SendTo { lobby_id, member_id, body, delivery })
    }

    /// Send a data message to every other member. Host only.
    pub fn send_to_members(
        &mut self,
        body: Payload,
        delivery: Delivery,
    ) -> Result<(), CommandError> {
        let lobby_id = self.require_host("send to members")?;
        self.submit(Command::SendToMembers { lobby_id, body, delivery })
    }

    fn submit(&mut self, command: Command) -> Result<(), CommandError> {
        let name = command.name();
        self.transport.submit(command).map_err(|error| {
            tracing::warn!(command = name, %error, "transport refused command");
            CommandError::from(error)
        })?;
        tracing::debug!(command = name, "command submitted");
        Ok(())
    }

    fn require_lobby(&self) -> Result<LobbyId, CommandError> {
        self.state.lobby_id().ok_or(CommandError::NotInLobby)
    }

    fn require_no_lobby(&self) -> Result<(), CommandError> {
        match self.state.lobby_id() {
            Some(lobby_id) => Err(CommandError::AlreadyInLobby { lobby_id }),
            None => Ok(()),
        }
    }

    fn require_host(&self, operation: &'static str) -> Result<LobbyId, CommandError> {
        let lobby_id = self.require_lobby()?;
        if !self.state.is_host() {
            return Err(CommandError::NotHost { operation });
        }
        Ok(lobby_id)
    }

    fn require_live_transfer(&self, id: &str) -> Result<&'a FileTransfer, CommandError> {
        let transfer = self
            .state
            .transfers()
            .get(id)
            .ok_or_else(|| CommandError::UnknownTransfer { id: id.to_owned() })?;
        if transfer.state.is_terminal() {
            return Err(CommandError::TransferFinished { id: id.to_owned() });
        }
        Ok(transfer)
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), CommandError> {
    if value.trim().is_empty() {
        return Err(CommandError::InvalidArgument { field, reason: "must not be blank" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{Lobby, Member, SessionIdentity};

    #[derive(Default)]
    struct Recorder {
        sent: Vec<Command>,
        closed: bool,
    }

    impl Transport for Recorder {
        fn submit(&mut self, command: Command) -> Result<(), TransportError> {
            if self.closed {
                return Err(TransportError::Closed);
            }
            self.sent.push(command);
            Ok(())
        }
    }

    fn idle() -> ClientState<Instant> {
        ClientState::new(SessionIdentity::new("ash", "127.0.0.1:7777"))
    }

    fn in_lobby(owner: Option<MemberId>) -> ClientState<Instant> {
        let mut state = idle();
        let mut lobby = Lobby::new(2, "B");
        lobby.owner_id = owner;
        lobby.members.insert(5, Member::new(5, "ash"));
        lobby.members.insert(6, Member::new(6, "bo"));
        state.lobby = Some(lobby);
        state.session.set_self_id(5);
        state
    }

    #[test]
    fn join_while_idle_is_forwarded() {
        let state = idle();
        let mut transport = Recorder::default();
        CommandGateway::new(&state, &mut transport).join_lobby(2).expect("join");
        assert_eq!(transport.sent, vec![Command::JoinLobby { lobby_id: 2 }]);
    }

    #[test]
    fn lobby_commands_need_a_lobby() {
        let state = idle();
        let mut transport = Recorder::default();
        let mut gateway = CommandGateway::new(&state, &mut transport);

        assert_eq!(gateway.leave_lobby(), Err(CommandError::NotInLobby));
        assert_eq!(gateway.send_chat("hi"), Err(CommandError::NotInLobby));
        assert_eq!(gateway.kick_member(6), Err(CommandError::NotInLobby));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn cannot_join_twice() {
        let state = in_lobby(None);
        let mut transport = Recorder::default();
        let mut gateway = CommandGateway::new(&state, &mut transport);
        assert_eq!(gateway.join_lobby(3), Err(CommandError::AlreadyInLobby { lobby_id: 2 }));
        assert_eq!(
            gateway.create_lobby("mine", 4, Privacy::Public),
            Err(CommandError::AlreadyInLobby { lobby_id: 2 })
        );
    }

    #[test]
    fn blank_chat_is_refused() {
        let state = in_lobby(None);
        let mut transport = Recorder::default();
        assert_eq!(
            CommandGateway::new(&state, &mut transport).send_chat("   "),
            Err(CommandError::EmptyMessage)
        );
    }

    #[test]
    fn kick_checks_self_and_roster() {
        let state = in_lobby(Some(5));
        let mut transport = Recorder::default();
        let mut gateway = CommandGateway::new(&state, &mut transport);

        assert_eq!(gateway.kick_member(5), Err(CommandError::CannotKickSelf));
        assert_eq!(gateway.kick_member(9), Err(CommandError::UnknownMember { member_id: 9 }));
        assert_eq!(gateway.kick_member(6), Ok(()));
    }

    #[test]
    fn lobby_data_is_host_only() {
        let guest = in_lobby(Some(6));
        let mut transport = Recorder::default();
        assert!(matches!(
            CommandGateway::new(&guest, &mut transport).set_lobby_data("map", "dust"),
            Err(CommandError::NotHost { .. })
        ));

        let host = in_lobby(Some(5));
        CommandGateway::new(&host, &mut transport).remove_lobby_data("map").expect("host");
        assert_eq!(
            transport.sent,
            vec![Command::RemoveLobbyData { lobby_id: 2, key: "map".into() }]
        );
    }

    #[test]
    fn create_lobby_validates_arguments() {
        let state = idle();
        let mut transport = Recorder::default();
        let mut gateway = CommandGateway::new(&state, &mut transport);

        assert!(matches!(
            gateway.create_lobby(" ", 4, Privacy::Public),
            Err(CommandError::InvalidArgument { field: "name", .. })
        ));
        assert!(matches!(
            gateway.create_lobby("mine", 0, Privacy::Private),
            Err(CommandError::InvalidArgument { field: "max_players", .. })
        ));
        assert!(matches!(
            gateway.direct_connect(""),
            Err(CommandError::InvalidArgument { field: "address", .. })
        ));
    }

    #[test]
    fn transport_refusal_surfaces() {
        let state = idle();
        let mut transport = Recorder { closed: true, ..Recorder::default() };
        assert_eq!(
            CommandGateway::new(&state, &mut transport).list_lobbies(),
            Err(CommandError::Transport(TransportError::Closed))
        );
    }

    #[test]
    fn transfer_commands_check_registry() {
        let state = in_lobby(None);
        let mut transport = Recorder::default();
        let mut gateway = CommandGateway::new(&state, &mut transport);
        assert_eq!(
            gateway.cancel_transfer("f1"),
            Err(CommandError::UnknownTransfer { id: "f1".into() })
        );
        assert_eq!(
            gateway.request_file("f1"),
            Err(CommandError::UnknownTransfer { id: "f1".into() })
        );
    }

    #[test]
    fn only_downloads_can_be_requested() {
        let mut state = in_lobby(Some(5));
        let mut shared = FileTransfer::requested("d1", Direction::Download, "maps/dust.bsp");
        shared.member = Some(6);
        let _ = state.transfers.insert(shared);
        let _ = state.transfers.insert(FileTransfer::requested("u1", Direction::Upload, "demo.dem"));

        let mut transport = Recorder::default();
        let mut gateway = CommandGateway::new(&state, &mut transport);
        assert_eq!(
            gateway.request_file("u1"),
            Err(CommandError::InvalidArgument {
                field: "id",
                reason: "own shared files cannot be requested",
            })
        );
        assert_eq!(gateway.request_file("d1"), Ok(()));
        assert_eq!(gateway.cancel_transfer("u1"), Ok(()));
        assert_eq!(transport.sent, vec![
            Command::RequestFile { id: "d1".into() },
            Command::CancelTransfer { id: "u1".into() },
        ]);
    }

    #[test]
    fn rename_and_share_need_a_lobby_and_text() {
        let idle = idle();
        let mut transport = Recorder::default();
        let mut gateway = CommandGateway::new(&idle, &mut transport);
        assert_eq!(gateway.set_lobby_name("C"), Err(CommandError::NotInLobby));
        assert_eq!(gateway.add_file("demo.dem"), Err(CommandError::NotInLobby));

        let state = in_lobby(None);
        let mut gateway = CommandGateway::new(&state, &mut transport);
        assert!(matches!(
            gateway.set_lobby_name("  "),
            Err(CommandError::InvalidArgument { field: "name", .. })
        ));
        assert!(matches!(
            gateway.add_file(""),
            Err(CommandError::InvalidArgument { field: "path", .. })
        ));
        gateway.set_lobby_name("C").expect("rename");
        gateway.add_file("demo.dem").expect("share");

        assert_eq!(transport.sent, vec![
            Command::SetLobbyName { lobby_id: 2, name: "C".into() },
            Command::AddFile { path: "demo.dem".into() },
        ]);
    }

    #[test]
    fn lobby_info_can_be_fetched_anywhere() {
        let mut transport = Recorder::default();
        for state in [idle(), in_lobby(None)] {
            CommandGateway::new(&state, &mut transport).fetch_lobby_info(7).expect("fetch");
        }
        assert_eq!(transport.sent, vec![
            Command::FetchLobbyInfo { lobby_id: 7 },
            Command::FetchLobbyInfo { lobby_id: 7 },
        ]);
    }

    #[test]
    fn data_to_host_needs_a_known_owner() {
        let body = || Payload::new().with("ready", true);
        let mut transport = Recorder::default();

        let idle = idle();
        assert_eq!(
            CommandGateway::new(&idle, &mut transport).send_to_host(body(), Delivery::default()),
            Err(CommandError::NotInLobby)
        );

        let ownerless = in_lobby(None);
        assert_eq!(
            CommandGateway::new(&ownerless, &mut transport)
                .send_to_host(body(), Delivery::default()),
            Err(CommandError::NoHost { lobby_id: 2 })
        );

        let guest = in_lobby(Some(6));
        CommandGateway::new(&guest, &mut transport)
            .send_to_host(body(), Delivery::unreliable(1))
            .expect("guest may message the host");
        assert_eq!(transport.sent, vec![Command::SendToHost {
            lobby_id: 2,
            host_id: 6,
            body: body(),
            delivery: Delivery { channel: 1, reliability: Reliability::Unreliable },
        }]);
    }

    #[test]
    fn data_to_members_is_host_only() {
        let body = || Payload::new().with("round", 3u64);
        let mut transport = Recorder::default();

        let guest = in_lobby(Some(6));
        let mut gateway = CommandGateway::new(&guest, &mut transport);
        assert!(matches!(
            gateway.send_to(6, body(), Delivery::default()),
            Err(CommandError::NotHost { .. })
        ));
        assert!(matches!(
            gateway.send_to_members(body(), Delivery::default()),
            Err(CommandError::NotHost { .. })
        ));

        let host = in_lobby(Some(5));
        let mut gateway = CommandGateway::new(&host, &mut transport);
        assert_eq!(
            gateway.send_to(9, body(), Delivery::default()),
            Err(CommandError::UnknownMember { member_id: 9 })
        );
        gateway.send_to(6, body(), Delivery::reliable(0)).expect("member is present");
        gateway.send_to_members(body(), Delivery::default()).expect("host");

        assert_eq!(transport.sent, vec![
            Command::SendTo {
                lobby_id: 2,
                member_id: 6,
                body: body(),
                delivery: Delivery::default(),
            },
            Command::SendToMembers { lobby_id: 2, body: body(), delivery: Delivery::default() },
        ]);
        assert_eq!(transport.sent[0].name(), "send_to");
    }
}
