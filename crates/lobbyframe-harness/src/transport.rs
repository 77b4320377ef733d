//! Transport double that records every command.

use lobbyframe_core::{Command, Transport, TransportError};

/// Records submitted commands. Can be switched to refuse everything.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Vec<Command>,
    refusing: Option<TransportError>,
}

impl RecordingTransport {
    /// Accepting transport with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that refuses every command with `error`.
    pub fn refusing(error: TransportError) -> Self {
        Self { sent: Vec::new(), refusing: Some(error) }
    }

    /// Commands accepted so far, in order.
    pub fn sent(&self) -> &[Command] {
        &self.sent
    }

    /// Take the recorded commands, leaving the record empty.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for RecordingTransport {
    fn submit(&mut self, command: Command) -> Result<(), TransportError> {
        if let Some(error) = &self.refusing {
            return Err(error.clone());
        }
        self.sent.push(command);
        Ok(())
    }
}
