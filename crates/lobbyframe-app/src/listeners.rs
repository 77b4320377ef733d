//! Closure listeners keyed by event kind.

use std::collections::BTreeMap;

use lobbyframe_core::ClientState;
use lobbyframe_proto::{EventKind, Payload};

/// Callback run after an event of its kind is applied.
///
/// Receives the event payload and the state after the change. Bound arguments
/// are whatever the closure captures.
pub(crate) type Listener<I> = Box<dyn FnMut(&Payload, &ClientState<I>)>;

/// Handle returned by [`crate::Runtime::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub(crate) struct Listeners<I> {
    by_kind: BTreeMap<EventKind, Vec<(ListenerId, Listener<I>)>>,
    next_id: u64,
}

impl<I> Listeners<I> {
    pub(crate) fn new() -> Self {
        Self { by_kind: BTreeMap::new(), next_id: 0 }
    }

    pub(crate) fn add(&mut self, kind: EventKind, listener: Listener<I>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.by_kind.entry(kind).or_default().push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        for listeners in self.by_kind.values_mut() {
            if let Some(index) = listeners.iter().position(|(existing, _)| *existing == id) {
                drop(listeners.remove(index));
                return true;
            }
        }
        false
    }

    /// Run every listener for `kind`, in registration order.
    pub(crate) fn notify(&mut self, kind: EventKind, payload: &Payload, state: &ClientState<I>) {
        if let Some(listeners) = self.by_kind.get_mut(&kind) {
            for (_, listener) in listeners {
                listener(payload, state);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}
