//! Replay errors.

use std::{io, path::PathBuf};

use lobbyframe_app::ChannelClosed;
use lobbyframe_proto::ProtocolError;
use thiserror::Error;

/// Why a replay could not run.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// The log file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The log is not a valid event log.
    #[error("invalid event log: {0}")]
    Protocol(#[from] ProtocolError),

    /// The runtime inbox closed before every record was queued.
    #[error("runtime inbox closed: {0}")]
    Inbox(#[from] ChannelClosed),
}
