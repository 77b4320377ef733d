//! Channel errors.

use thiserror::Error;

/// The other end of a channel was dropped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("channel closed")]
pub struct ChannelClosed;
