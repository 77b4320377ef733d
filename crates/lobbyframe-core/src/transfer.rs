//! File transfer tracking.
//!
//! Each transfer is a small state machine driven only by inbound events:
//!
//! ```text
//! Requested ──► InProgress ──► Finished
//!     │             │
//!     └─────────────┴────────► Cancelled
//! ```
//!
//! Terminal entries stay visible for a retention window so the rendering layer
//! can show the result, then [`TransferRegistry::sweep`] drops them.

use std::{collections::BTreeMap, ops::Sub, time::Duration};

use crate::{IgnoreReason, MemberId, Outcome, Progress, StaleRef, TransferId};

/// Which way the bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// We are sending.
    Upload,
    /// We are receiving.
    Download,
}

impl Direction {
    /// Wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "upload" => Some(Self::Upload),
            "download" => Some(Self::Download),
            _ => None,
        }
    }
}

/// Lifecycle state of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Announced, no bytes moved yet.
    Requested,
    /// Bytes are moving.
    InProgress,
    /// All bytes arrived.
    Finished,
    /// Aborted by either side.
    Cancelled,
}

impl TransferState {
    /// Finished or cancelled. No further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

/// One tracked transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransfer {
    /// Transport-assigned id.
    pub id: TransferId,
    /// Upload or download.
    pub direction: Direction,
    /// File path as announced.
    pub path: String,
    /// Remote peer, when known.
    pub member: Option<MemberId>,
    /// Size in bytes, when known.
    pub total_bytes: Option<u64>,
    /// Bytes moved so far. Never decreases.
    pub transferred_bytes: u64,
    /// Lifecycle state.
    pub state: TransferState,
    /// Integrity flag reported when a download completes.
    pub valid: bool,
}

impl FileTransfer {
    /// Fresh `Requested` transfer with nothing moved.
    pub fn requested(id: impl Into<TransferId>, direction: Direction, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction,
            path: path.into(),
            member: None,
            total_bytes: None,
            transferred_bytes: 0,
            state: TransferState::Requested,
            valid: true,
        }
    }

    /// Completed fraction in `0.0..=1.0`, when the size is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(1.0),
            Some(total) => Some(self.transferred_bytes as f64 / total as f64),
            None => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<I> {
    transfer: FileTransfer,
    terminal_since: Option<I>,
}

/// All transfers keyed by id.
///
/// Generic over `I` (the environment's instant type) so retention is measured
/// on the same clock in production and in tests.
#[derive(Debug, Clone)]
pub struct TransferRegistry<I> {
    entries: BTreeMap<TransferId, Entry<I>>,
}

impl<I> Default for TransferRegistry<I> {
    fn default() -> Self {
        Self { entries: BTreeMap::new() }
    }
}

impl<I> TransferRegistry<I> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a transfer.
    pub fn get(&self, id: &str) -> Option<&FileTransfer> {
        self.entries.get(id).map(|entry| &entry.transfer)
    }

    /// Whether `id` is tracked.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of tracked transfers, terminal ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transfers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FileTransfer> {
        self.entries.values().map(|entry| &entry.transfer)
    }

    /// Transfers that have not reached a terminal state.
    pub fn active(&self) -> impl Iterator<Item = &FileTransfer> {
        self.iter().filter(|transfer| !transfer.state.is_terminal())
    }

    /// Track a new transfer. An id that is already tracked is left alone.
    pub(crate) fn insert(&mut self, transfer: FileTransfer) -> Outcome {
        if self.entries.contains_key(&transfer.id) {
            return Outcome::Unchanged;
        }
        self.entries.insert(transfer.id.clone(), Entry { transfer, terminal_since: None });
        Outcome::Applied
    }

    /// A peer asked for one of our files.
    ///
    /// Creates a `Requested` upload when the id is new. For a known id only
    /// the requesting member is recorded.
    pub(crate) fn note_request(
        &mut self,
        id: TransferId,
        path: Option<String>,
        total_bytes: Option<u64>,
        member: Option<MemberId>,
    ) -> Outcome {
        if let Some(entry) = self.entries.get_mut(&id) {
            let changed = member.is_some() && entry.transfer.member != member;
            if changed {
                entry.transfer.member = member;
            }
            return Outcome::changed(changed);
        }

        let mut transfer =
            FileTransfer::requested(id, Direction::Upload, path.unwrap_or_default());
        transfer.total_bytes = total_bytes;
        transfer.member = member;
        self.insert(transfer)
    }

    /// Drop a transfer whatever its state.
    pub(crate) fn remove(&mut self, id: &str) -> Outcome {
        match self.entries.remove(id) {
            Some(_) => Outcome::Applied,
            None => stale(id),
        }
    }

    /// Record progress. Never lowers `transferred_bytes`, never exceeds a
    /// known `total_bytes`.
    pub(crate) fn progress(&mut self, id: &str, progress: Progress) -> Outcome {
        let Some(entry) = self.entries.get_mut(id) else {
            return stale(id);
        };
        let transfer = &mut entry.transfer;
        if transfer.state.is_terminal() {
            return IgnoreReason::Terminal(id.to_owned()).into();
        }

        let mut changed = false;
        if transfer.state == TransferState::Requested {
            transfer.state = TransferState::InProgress;
            changed = true;
        }

        let reported = match progress {
            Progress::Bytes(bytes) => Some(bytes),
            // Without a size a percentage cannot be turned into bytes.
            Progress::Percent(percent) => transfer.total_bytes.map(|total| percent_of(total, percent)),
        };

        if let Some(reported) = reported {
            let clamped = transfer.total_bytes.map_or(reported, |total| reported.min(total));
            if clamped < reported {
                tracing::debug!(
                    id,
                    reported,
                    total = clamped,
                    "progress beyond transfer size, clamping to total"
                );
            }

            if clamped < transfer.transferred_bytes {
                tracing::warn!(
                    id,
                    current = transfer.transferred_bytes,
                    reported = clamped,
                    "transfer progress went backwards, keeping current"
                );
            } else if clamped > transfer.transferred_bytes {
                transfer.transferred_bytes = clamped;
                changed = true;
            }
        }

        Outcome::changed(changed)
    }

    /// Mark a transfer finished. The byte count is raised to the total (or
    /// the total is fixed at the byte count when it was unknown).
    pub(crate) fn finish(&mut self, id: &str, valid: Option<bool>, now: I) -> Outcome {
        let Some(entry) = self.entries.get_mut(id) else {
            return stale(id);
        };
        let transfer = &mut entry.transfer;
        match transfer.state {
            TransferState::Finished => return Outcome::Unchanged,
            TransferState::Cancelled => return IgnoreReason::Terminal(id.to_owned()).into(),
            TransferState::Requested | TransferState::InProgress => {},
        }

        transfer.state = TransferState::Finished;
        match transfer.total_bytes {
            Some(total) => transfer.transferred_bytes = transfer.transferred_bytes.max(total),
            None => transfer.total_bytes = Some(transfer.transferred_bytes),
        }
        if let Some(valid) = valid {
            transfer.valid = valid;
        }
        entry.terminal_since = Some(now);
        Outcome::Applied
    }

    /// Cancel a live transfer.
    pub(crate) fn cancel(&mut self, id: &str, now: I) -> Outcome {
        let Some(entry) = self.entries.get_mut(id) else {
            return stale(id);
        };
        if entry.transfer.state.is_terminal() {
            return IgnoreReason::Terminal(id.to_owned()).into();
        }
        entry.transfer.state = TransferState::Cancelled;
        entry.terminal_since = Some(now);
        Outcome::Applied
    }
}

impl<I: Copy + Ord + Sub<Output = Duration>> TransferRegistry<I> {
    /// Remove terminal transfers whose retention window has elapsed.
    ///
    /// Returns the number removed.
    pub(crate) fn sweep(&mut self, now: I, retention: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| match entry.terminal_since {
            Some(since) => now < since || now - since < retention,
            None => true,
        });
        before - self.entries.len()
    }
}

fn stale(id: &str) -> Outcome {
    IgnoreReason::Stale(StaleRef::Transfer(id.to_owned())).into()
}

fn percent_of(total: u64, percent: f64) -> u64 {
    let bytes = (total as f64 * percent.clamp(0.0, 100.0) / 100.0).round() as u64;
    bytes.min(total)
}
