//! Observable client state, captured between events.
//!
//! A snapshot is refreshed with [`ClientSnapshot::observe`] after every step.
//! Besides the current state it keeps what temporal invariants need: every
//! byte count a transfer has shown and every chat order counter value.

use std::collections::BTreeMap;

use lobbyframe_core::{ClientState, LobbyId, MemberId, TransferId, TransferState};

/// One transfer as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSnapshot {
    /// Lifecycle state.
    pub state: TransferState,
    /// Bytes moved so far.
    pub transferred_bytes: u64,
    /// Size, when known.
    pub total_bytes: Option<u64>,
}

impl TransferSnapshot {
    /// Snapshot with the given state and counters.
    pub fn new(state: TransferState, transferred_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self { state, transferred_bytes, total_bytes }
    }
}

/// Client state plus the history of a run.
#[derive(Debug, Clone, Default)]
pub struct ClientSnapshot {
    /// Current lobby, if any.
    pub lobby_id: Option<LobbyId>,
    /// `(map key, member.id)` for every roster entry.
    pub roster: Vec<(MemberId, MemberId)>,
    /// `received_order` of each retained chat message, in log order.
    pub chat_orders: Vec<u64>,
    /// Chat order counter after each observation.
    pub next_order_history: Vec<u64>,
    /// Current transfers.
    pub transfers: BTreeMap<TransferId, TransferSnapshot>,
    /// Byte counts each live transfer has shown, oldest first.
    ///
    /// History is dropped when a transfer leaves the registry, so an id that
    /// is re-announced starts over.
    pub transfer_history: BTreeMap<TransferId, Vec<u64>>,
}

impl ClientSnapshot {
    /// Capture a fresh snapshot with single-entry history.
    pub fn capture<I>(state: &ClientState<I>) -> Self {
        let mut snapshot = Self::default();
        snapshot.observe(state);
        snapshot
    }

    /// Refresh from `state`, extending the history.
    pub fn observe<I>(&mut self, state: &ClientState<I>) {
        self.lobby_id = state.lobby_id();
        self.roster = state
            .lobby()
            .map(|lobby| lobby.members.iter().map(|(key, m)| (*key, m.id)).collect())
            .unwrap_or_default();
        self.chat_orders = state.chat().messages().iter().map(|m| m.received_order).collect();
        self.next_order_history.push(state.chat().next_order());

        self.transfers = state
            .transfers()
            .iter()
            .map(|t| {
                (t.id.clone(), TransferSnapshot::new(t.state, t.transferred_bytes, t.total_bytes))
            })
            .collect();

        self.transfer_history.retain(|id, _| self.transfers.contains_key(id));
        for (id, transfer) in &self.transfers {
            self.transfer_history.entry(id.clone()).or_default().push(transfer.transferred_bytes);
        }
    }

    /// Set the current lobby.
    pub fn with_lobby(mut self, lobby_id: LobbyId) -> Self {
        self.lobby_id = Some(lobby_id);
        self
    }

    /// Add a chat message with the given order.
    pub fn with_chat(mut self, order: u64) -> Self {
        self.chat_orders.push(order);
        self
    }

    /// Add a transfer and record its byte count in the history.
    pub fn with_transfer(mut self, id: &str, transfer: TransferSnapshot) -> Self {
        self.transfer_history.entry(id.to_owned()).or_default().push(transfer.transferred_bytes);
        self.transfers.insert(id.to_owned(), transfer);
        self
    }
}
