//! Lobbyframe event-log replay binary.
//!
//! # Usage
//!
//! ```bash
//! # Replay a captured session
//! lobbyframe-replay session.cbor
//!
//! # Watch every routing decision, with a tight tick budget
//! lobbyframe-replay session.cbor --log-level trace --max-events-per-tick 8
//!
//! # Let retention play out: one simulated second per tick
//! lobbyframe-replay session.cbor --tick-millis 1000
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use lobbyframe_app::RuntimeConfig;
use lobbyframe_cli::{ReplayConfig, replay_file};
use lobbyframe_core::{ClientConfig, SessionIdentity};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Lobbyframe event-log replay
#[derive(Parser, Debug)]
#[command(name = "lobbyframe-replay")]
#[command(about = "Replay a recorded lobby event log through the client runtime")]
#[command(version)]
struct Args {
    /// CBOR event log to replay
    log: PathBuf,

    /// Local user name for the session
    #[arg(long, default_value = "replay")]
    user_name: String,

    /// Local address for the session
    #[arg(long, default_value = "127.0.0.1")]
    local_address: String,

    /// Seconds finished or cancelled transfers stay visible
    #[arg(long, default_value = "30")]
    retention_secs: u64,

    /// Simulated milliseconds between two ticks
    #[arg(long, default_value = "100")]
    tick_millis: u64,

    /// Maximum events routed per tick
    #[arg(long, default_value = "256")]
    max_events_per_tick: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = ReplayConfig {
        identity: SessionIdentity::new(args.user_name, args.local_address),
        runtime: RuntimeConfig {
            client: ClientConfig { transfer_retention: Duration::from_secs(args.retention_secs) },
            max_events_per_tick: args.max_events_per_tick,
        },
        tick_interval: Duration::from_millis(args.tick_millis),
    };

    tracing::info!("Replaying {}", args.log.display());
    let summary = replay_file(&args.log, config)?;

    tracing::info!(
        records = summary.records,
        rejected = summary.rejected,
        ticks = summary.ticks,
        applied = summary.applied,
        unchanged = summary.unchanged,
        ignored = summary.ignored,
        swept = summary.swept,
        elapsed_ms = summary.elapsed.as_millis(),
        "replay complete"
    );
    tracing::info!(
        lobby = summary.lobby.as_deref().unwrap_or("<none>"),
        members = summary.members,
        chat_messages = summary.chat_messages,
        transfers = summary.transfers,
        connected = summary.connected,
        "final client state"
    );

    Ok(())
}
