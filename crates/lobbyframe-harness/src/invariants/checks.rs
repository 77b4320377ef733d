//! Client state invariants.

use lobbyframe_core::TransferState;

use super::{ClientSnapshot, Invariant, InvariantResult, Violation};

/// Chat history only exists inside a lobby.
pub struct ChatRequiresLobby;

impl Invariant for ChatRequiresLobby {
    fn name(&self) -> &'static str {
        "chat_requires_lobby"
    }

    fn check(&self, snapshot: &ClientSnapshot) -> InvariantResult {
        if snapshot.lobby_id.is_none() && !snapshot.chat_orders.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "not in a lobby but {} chat messages retained",
                    snapshot.chat_orders.len()
                ),
            });
        }
        Ok(())
    }
}

/// Chat orders strictly increase and the order counter never goes back.
pub struct ChatOrderIncreasing;

impl Invariant for ChatOrderIncreasing {
    fn name(&self) -> &'static str {
        "chat_order_increasing"
    }

    fn check(&self, snapshot: &ClientSnapshot) -> InvariantResult {
        if let Some(pair) = snapshot.chat_orders.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("chat order {} followed by {}", pair[0], pair[1]),
            });
        }

        if let Some(pair) = snapshot.next_order_history.windows(2).find(|w| w[0] > w[1]) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("order counter went from {} back to {}", pair[0], pair[1]),
            });
        }

        if let (Some(&last), Some(&next)) =
            (snapshot.chat_orders.last(), snapshot.next_order_history.last())
            && last >= next
        {
            return Err(Violation {
                invariant: self.name(),
                message: format!("message order {last} not below counter {next}"),
            });
        }
        Ok(())
    }
}

/// Every roster entry is keyed by its own member id.
pub struct RosterKeysMatchIds;

impl Invariant for RosterKeysMatchIds {
    fn name(&self) -> &'static str {
        "roster_keys_match_ids"
    }

    fn check(&self, snapshot: &ClientSnapshot) -> InvariantResult {
        if let Some((key, id)) = snapshot.roster.iter().find(|(key, id)| key != id) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("member {id} stored under key {key}"),
            });
        }
        Ok(())
    }
}

/// Byte counts stay within the known size and finished means complete.
pub struct TransferWithinBounds;

impl Invariant for TransferWithinBounds {
    fn name(&self) -> &'static str {
        "transfer_within_bounds"
    }

    fn check(&self, snapshot: &ClientSnapshot) -> InvariantResult {
        for (id, transfer) in &snapshot.transfers {
            if let Some(total) = transfer.total_bytes {
                if transfer.transferred_bytes > total {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "transfer {id} at {} of {total} bytes",
                            transfer.transferred_bytes
                        ),
                    });
                }

                if transfer.state == TransferState::Finished && transfer.transferred_bytes != total
                {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "transfer {id} finished at {} of {total} bytes",
                            transfer.transferred_bytes
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A transfer's byte count never decreases while it is tracked.
pub struct TransferMonotonicity;

impl Invariant for TransferMonotonicity {
    fn name(&self) -> &'static str {
        "transfer_monotonicity"
    }

    fn check(&self, snapshot: &ClientSnapshot) -> InvariantResult {
        for (id, history) in &snapshot.transfer_history {
            if let Some(pair) = history.windows(2).find(|w| w[0] > w[1]) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("transfer {id} went from {} to {} bytes", pair[0], pair[1]),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransferSnapshot;

    #[test]
    fn chat_without_lobby_is_flagged() {
        let snapshot = ClientSnapshot::default().with_chat(0);
        assert!(ChatRequiresLobby.check(&snapshot).is_err());
        assert!(ChatRequiresLobby.check(&snapshot.with_lobby(1)).is_ok());
    }

    #[test]
    fn repeated_chat_order_is_flagged() {
        let snapshot = ClientSnapshot::default().with_lobby(1).with_chat(2).with_chat(2);
        let violation = ChatOrderIncreasing.check(&snapshot).expect_err("orders repeat");
        assert_eq!(violation.invariant, "chat_order_increasing");
    }

    #[test]
    fn counter_regression_is_flagged() {
        let mut snapshot = ClientSnapshot::default();
        snapshot.next_order_history = vec![3, 1];
        assert!(ChatOrderIncreasing.check(&snapshot).is_err());
    }

    #[test]
    fn mismatched_roster_key_is_flagged() {
        let mut snapshot = ClientSnapshot::default().with_lobby(1);
        snapshot.roster = vec![(1, 1), (2, 3)];
        assert!(RosterKeysMatchIds.check(&snapshot).is_err());
    }

    #[test]
    fn overflowing_transfer_is_flagged() {
        let snapshot = ClientSnapshot::default()
            .with_transfer("f", TransferSnapshot::new(TransferState::InProgress, 11, Some(10)));
        assert!(TransferWithinBounds.check(&snapshot).is_err());
    }

    #[test]
    fn incomplete_finished_transfer_is_flagged() {
        let snapshot = ClientSnapshot::default()
            .with_transfer("f", TransferSnapshot::new(TransferState::Finished, 4, Some(10)));
        assert!(TransferWithinBounds.check(&snapshot).is_err());
    }

    #[test]
    fn shrinking_transfer_is_flagged() {
        let snapshot = ClientSnapshot::default()
            .with_transfer("f", TransferSnapshot::new(TransferState::InProgress, 6, Some(10)))
            .with_transfer("f", TransferSnapshot::new(TransferState::InProgress, 5, Some(10)));
        assert!(TransferMonotonicity.check(&snapshot).is_err());
    }
}
