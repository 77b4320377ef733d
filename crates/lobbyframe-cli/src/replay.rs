//! Replay driver.
//!
//! Records are queued through an [`EventSender`] exactly as a transport would
//! queue them, then the runtime ticks until the inbox reports the sender gone.
//! The per-tick budget therefore applies to replays too.
//!
//! Replays run on a recorded-time clock rather than the wall clock: every tick
//! advances it by [`ReplayConfig::tick_interval`], so transfer retention
//! behaves the same however fast the log is drained.

use std::{path::Path, time::Duration};

use lobbyframe_app::{Runtime, RuntimeConfig, TickReport};
use lobbyframe_core::{ClientState, SessionIdentity, env::test_utils::MockEnv};
use lobbyframe_proto::{EventKind, EventRecord, decode_log};

use crate::ReplayError;

/// How to replay a log.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Local identity the session starts with.
    pub identity: SessionIdentity,
    /// Runtime tunables.
    pub runtime: RuntimeConfig,
    /// Simulated time between two ticks.
    pub tick_interval: Duration,
}

/// Default simulated time between two replay ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            identity: SessionIdentity::new("replay", "127.0.0.1"),
            runtime: RuntimeConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// What a replay did and where the client ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Usable records in the log.
    pub records: usize,
    /// Records skipped because they could not be decoded.
    pub rejected: usize,
    /// Ticks needed to drain the inbox.
    pub ticks: usize,
    /// Events that changed state.
    pub applied: usize,
    /// Events already reflected in state.
    pub unchanged: usize,
    /// Events dropped by the router.
    pub ignored: usize,
    /// Terminal transfers removed by retention sweeps.
    pub swept: usize,
    /// Lobby the client is in at the end.
    pub lobby: Option<String>,
    /// Roster size of that lobby.
    pub members: usize,
    /// Chat messages retained.
    pub chat_messages: usize,
    /// Transfers still tracked.
    pub transfers: usize,
    /// Final connectivity.
    pub connected: bool,
    /// Simulated time the replay covered.
    pub elapsed: Duration,
}

impl ReplaySummary {
    fn add(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.applied += report.applied;
        self.unchanged += report.unchanged;
        self.ignored += report.ignored;
        self.swept += report.swept;
    }

    fn capture<I>(&mut self, state: &ClientState<I>) {
        self.lobby = state.lobby().map(|lobby| format!("{} ({})", lobby.name, lobby.id));
        self.members = state.lobby().map_or(0, |lobby| lobby.member_count());
        self.chat_messages = state.chat().len();
        self.transfers = state.transfers().len();
        self.connected = state.session().is_connected();
    }
}

/// Read, decode and replay a log file.
///
/// # Errors
///
/// - `ReplayError::Io` if the file cannot be read
/// - `ReplayError::Protocol` if it is not a valid event log
///
/// Individual records that fail to decode are logged, counted in
/// [`ReplaySummary::rejected`] and skipped.
pub fn replay_file(path: &Path, config: ReplayConfig) -> Result<ReplaySummary, ReplayError> {
    let bytes = std::fs::read(path)
        .map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    let log = decode_log(&bytes)?;
    for rejected in &log.rejected {
        tracing::warn!(index = rejected.index, "skipping record: {}", rejected.error);
    }
    tracing::info!(
        path = %path.display(),
        records = log.records.len(),
        rejected = log.rejected.len(),
        "event log loaded"
    );

    let rejected = log.rejected.len();
    let mut summary = replay_records(log.records, config)?;
    summary.rejected = rejected;
    Ok(summary)
}

/// Replay already-decoded records.
///
/// # Errors
///
/// `ReplayError::Inbox` if the runtime inbox closes while records are queued.
pub fn replay_records(
    records: Vec<EventRecord>,
    config: ReplayConfig,
) -> Result<ReplaySummary, ReplayError> {
    let clock = MockEnv::new();
    let (mut runtime, sender) = Runtime::new(clock.clone(), config.identity, config.runtime);

    runtime.on(EventKind::Chat, |_, state| {
        if let Some(message) = state.chat().last() {
            tracing::info!(
                member = ?message.member,
                order = message.received_order,
                text = %message.text,
                "chat"
            );
        }
    });
    runtime.on(EventKind::Error, |_, state| {
        if let Some(failure) = state.session().last_error() {
            tracing::warn!(code = ?failure.code, "transport error: {}", failure.message);
        }
    });

    let mut summary = ReplaySummary { records: records.len(), ..ReplaySummary::default() };
    for record in records {
        sender.send_record(record)?;
    }
    drop(sender);

    loop {
        let report = runtime.tick();
        summary.add(&report);
        tracing::debug!(
            processed = report.processed,
            backlog = report.backlog,
            swept = report.swept,
            "tick"
        );
        if report.disconnected {
            break;
        }
        clock.advance(config.tick_interval);
    }

    summary.elapsed = clock.elapsed();
    summary.capture(runtime.state());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use ciborium::value::Value as CborValue;
    use lobbyframe_core::ClientConfig;
    use lobbyframe_proto::{Payload, encode_log};

    use super::*;

    fn sample_log() -> Vec<EventRecord> {
        vec![
            EventRecord::new("connection_changed", Payload::new().with("connected", true)),
            EventRecord::new("self_joined", Payload::new().with("id", 5u64).with("name", "den")),
            EventRecord::new(
                "player_joined",
                Payload::new().with("id", 2u64).with("name", "ash").with("lobby_id", 5u64),
            ),
            EventRecord::new("chat", Payload::new().with("member", 2u64).with("text", "hi")),
            EventRecord::new("chat", Payload::new().with("member", 2u64).with("text", "hi")),
            EventRecord::new("lobby_teleported", Payload::new()),
            EventRecord::new("max_players_changed", Payload::new().with("lobby_id", 9u64)),
        ]
    }

    #[test]
    fn replay_reports_final_state() {
        let summary = replay_records(sample_log(), ReplayConfig::default()).expect("replay");

        assert_eq!(summary.records, 7);
        assert_eq!(summary.applied, 5);
        assert_eq!(summary.ignored, 2);
        assert_eq!(summary.lobby.as_deref(), Some("den (5)"));
        assert_eq!(summary.members, 1);
        assert_eq!(summary.chat_messages, 2);
        assert!(summary.connected);
    }

    #[test]
    fn small_budget_needs_more_ticks() {
        let config = ReplayConfig {
            runtime: RuntimeConfig { max_events_per_tick: 2, ..RuntimeConfig::default() },
            ..ReplayConfig::default()
        };
        let summary = replay_records(sample_log(), config).expect("replay");

        // 7 records at 2 per tick, plus the tick that observes the closed inbox.
        assert!(summary.ticks >= 4);
        assert_eq!(summary.applied + summary.unchanged + summary.ignored, 7);
    }

    #[test]
    fn replay_file_reads_encoded_log() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(&encode_log(&sample_log()).expect("encode")).expect("write");

        let summary = replay_file(file.path(), ReplayConfig::default()).expect("replay");
        assert_eq!(summary.records, 7);
    }

    #[test]
    fn replay_file_skips_undecodable_records() {
        let good = encode_log(&sample_log()[..2]).expect("encode");
        let CborValue::Array(mut items) =
            ciborium::de::from_reader::<CborValue, _>(good.as_slice()).expect("decode")
        else {
            unreachable!("encoded log is an array");
        };
        let text = |s: &str| CborValue::Text(s.to_owned());
        items.insert(
            1,
            CborValue::Map(vec![
                (text("type"), text("chat")),
                (text("data"), CborValue::Map(vec![(text("blob"), CborValue::Bytes(vec![1, 2]))])),
            ]),
        );
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&CborValue::Array(items), &mut bytes).expect("encode");

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(&bytes).expect("write");

        let summary = replay_file(file.path(), ReplayConfig::default()).expect("replay");
        assert_eq!(summary.records, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.lobby.as_deref(), Some("den (5)"));
        assert!(summary.connected);
    }

    #[test]
    fn retention_follows_replay_ticks() {
        let transfer_id = || Payload::new().with("id", "f1");
        let log = vec![
            EventRecord::new(
                "file_added",
                transfer_id().with("path", "maps/arena.bsp").with("total_bytes", 4096u64),
            ),
            EventRecord::new("transfer_cancelled", transfer_id()),
            EventRecord::new("connection_changed", Payload::new().with("connected", true)),
            EventRecord::new("connection_changed", Payload::new().with("connected", true)),
            EventRecord::new("connection_changed", Payload::new().with("connected", true)),
        ];
        let config = ReplayConfig {
            runtime: RuntimeConfig {
                client: ClientConfig { transfer_retention: Duration::from_secs(30) },
                max_events_per_tick: 1,
            },
            tick_interval: Duration::from_secs(10),
            ..ReplayConfig::default()
        };

        let summary = replay_records(log, config).expect("replay");

        // Cancelled at 10s and swept at 40s. The sixth tick sees the closed inbox.
        assert_eq!(summary.ticks, 6);
        assert_eq!(summary.elapsed, Duration::from_secs(50));
        assert_eq!(summary.swept, 1);
        assert_eq!(summary.transfers, 0);
    }

    #[test]
    fn short_replay_keeps_terminal_transfers() {
        let transfer_id = || Payload::new().with("id", "f1");
        let log = vec![
            EventRecord::new(
                "file_added",
                transfer_id().with("path", "maps/arena.bsp").with("total_bytes", 4096u64),
            ),
            EventRecord::new("transfer_cancelled", transfer_id()),
        ];

        let summary = replay_records(log, ReplayConfig::default()).expect("replay");
        assert_eq!(summary.swept, 0);
        assert_eq!(summary.transfers, 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = replay_file(Path::new("/nonexistent/lobby.cbor"), ReplayConfig::default());
        assert!(matches!(result, Err(ReplayError::Io { .. })));
    }

    #[test]
    fn garbage_file_is_a_protocol_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"not cbor at all").expect("write");

        let result = replay_file(file.path(), ReplayConfig::default());
        assert!(matches!(result, Err(ReplayError::Protocol(_))));
    }
}
