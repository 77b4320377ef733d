//! Single-threaded client runtime.
//!
//! The Runtime owns the [`EventRouter`] and is the only thing that mutates
//! client state. One [`Runtime::tick`]:
//! 1. Drains up to `max_events_per_tick` events from the inbox, in push order
//! 2. Routes each one and runs the listeners of every applied event
//! 3. Sweeps transfers whose retention window has passed

use lobbyframe_core::{
    ClientState, CommandGateway, Environment, EventRouter, Outcome, SessionIdentity, Transport,
};
use lobbyframe_proto::{EventKind, EventRecord, Payload};

use crate::{
    EventInbox, EventSender, ListenerId, RuntimeConfig, event_channel,
    listeners::Listeners,
};

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Events taken from the inbox.
    pub processed: usize,
    /// Events that changed state.
    pub applied: usize,
    /// Events that were already reflected in state.
    pub unchanged: usize,
    /// Events that were dropped.
    pub ignored: usize,
    /// Terminal transfers removed by the sweep.
    pub swept: usize,
    /// Events still queued because the per-tick budget ran out.
    pub backlog: usize,
    /// The transport dropped its sender and the inbox is drained.
    pub disconnected: bool,
}

impl TickReport {
    fn record(&mut self, outcome: &Outcome) {
        self.processed += 1;
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Ignored(_) => self.ignored += 1,
        }
    }
}

/// Owns the client state and drives it from the inbox.
///
/// # Type Parameters
///
/// - `E`: Environment providing the clock used for transfer retention
pub struct Runtime<E: Environment> {
    router: EventRouter<E>,
    inbox: EventInbox,
    listeners: Listeners<E::Instant>,
    max_events_per_tick: usize,
}

impl<E: Environment> Runtime<E> {
    /// Create a runtime and the sender the transport should push events into.
    pub fn new(env: E, identity: SessionIdentity, config: RuntimeConfig) -> (Self, EventSender) {
        let (sender, inbox) = event_channel();
        let runtime = Self {
            router: EventRouter::new(env, identity, config.client),
            inbox,
            listeners: Listeners::new(),
            max_events_per_tick: config.max_events_per_tick.max(1),
        };
        (runtime, sender)
    }

    /// Drain the inbox (up to the per-tick budget), then sweep transfers.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        while report.processed < self.max_events_per_tick {
            match self.inbox.try_next() {
                Ok(Some(record)) => {
                    let outcome = self.route(&record.kind, &record.payload);
                    report.record(&outcome);
                },
                Ok(None) => break,
                Err(_) => {
                    report.disconnected = true;
                    break;
                },
            }
        }

        report.backlog = self.inbox.len();
        report.swept = self.router.sweep();

        if report.backlog > 0 {
            tracing::debug!(backlog = report.backlog, "tick budget exhausted");
        }
        report
    }

    /// Route one event immediately, bypassing the inbox.
    ///
    /// For callers that already run on the runtime thread, such as log
    /// replay.
    pub fn inject(&mut self, record: &EventRecord) -> Outcome {
        self.route(&record.kind, &record.payload)
    }

    /// Register a listener for `kind`. It runs after every applied event of
    /// that kind, never for unchanged or ignored ones.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&Payload, &ClientState<E::Instant>) + 'static,
    {
        self.listeners.add(kind, Box::new(listener))
    }

    /// Unregister a listener. Returns false if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Read-only client state.
    pub fn state(&self) -> &ClientState<E::Instant> {
        self.router.state()
    }

    /// The underlying router.
    pub fn router(&self) -> &EventRouter<E> {
        &self.router
    }

    /// Command gateway over the current state.
    pub fn commands<'a, T: Transport + ?Sized>(
        &'a self,
        transport: &'a mut T,
    ) -> CommandGateway<'a, E::Instant, T> {
        CommandGateway::new(self.router.state(), transport)
    }

    fn route(&mut self, name: &str, payload: &Payload) -> Outcome {
        let outcome = self.router.dispatch(name, payload);
        if outcome.is_applied()
            && let Some(kind) = EventKind::from_name(name)
        {
            self.listeners.notify(kind, payload, self.router.state());
        }
        outcome
    }
}
