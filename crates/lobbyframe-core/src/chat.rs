//! Chat log for the current lobby.

use crate::MemberId;

/// One chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender. `None` for system messages.
    pub member: Option<MemberId>,
    /// Message text.
    pub text: String,
    /// Arrival position, strictly increasing for the life of the session.
    pub received_order: u64,
}

/// Append-only chat history of the current lobby.
///
/// Cleared on leave and on join. The order counter is never reset, so a
/// message from a later lobby always sorts after one from an earlier lobby.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    next_order: u64,
}

impl ChatLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Order that the next appended message will get.
    pub fn next_order(&self) -> u64 {
        self.next_order
    }

    pub(crate) fn append(&mut self, member: Option<MemberId>, text: String) -> u64 {
        let received_order = self.next_order;
        self.next_order += 1;
        self.messages.push(ChatMessage { member, text, received_order });
        received_order
    }

    /// Returns whether anything was removed.
    pub(crate) fn clear(&mut self) -> bool {
        let had_messages = !self.messages.is_empty();
        self.messages.clear();
        had_messages
    }
}
