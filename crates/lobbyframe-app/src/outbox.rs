//! Command channel from the runtime thread to the transport.

use lobbyframe_core::{Command, Transport, TransportError};
use tokio::sync::mpsc;

/// Create a connected transport/receiver pair.
pub fn command_channel() -> (ChannelTransport, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelTransport { tx }, CommandReceiver { rx })
}

/// [`Transport`] that queues commands for another thread.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Command>,
}

impl Transport for ChannelTransport {
    fn submit(&mut self, command: Command) -> Result<(), TransportError> {
        self.tx.send(command).map_err(|_| TransportError::Closed)
    }
}

/// Transport-side end of the command channel.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandReceiver {
    /// Wait for the next command. `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<Command> {
        self.rx.recv().await
    }

    /// Take every queued command without waiting.
    pub fn drain(&mut self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.rx.len());
        while let Ok(command) = self.rx.try_recv() {
            commands.push(command);
        }
        commands
    }
}
