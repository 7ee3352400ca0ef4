// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
#[oai(rename_all = "snake_case")]
pub enum SendStatus {
    #[default]
    Preparing,
    Sending,
    /// Every contact was attempted; individual recipients may still have failed.
    Completed,
    /// A precondition or credential failure stopped the run.
    Failed,
    /// Stopped between two sends on request.
    Cancelled,
    /// The daily quota ran out; the remaining contacts were not attempted.
    LimitReached,
}

impl SendStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SendStatus::Preparing | SendStatus::Sending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Preparing => "preparing",
            SendStatus::Sending => "sending",
            SendStatus::Completed => "completed",
            SendStatus::Failed => "failed",
            SendStatus::Cancelled => "cancelled",
            SendStatus::LimitReached => "limit_reached",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SendStatus::Preparing => 0,
            SendStatus::Sending => 1,
            _ => 2,
        }
    }

    /// Moves are forward only: preparing, then sending, then one terminal state.
    pub fn can_transition_to(&self, next: SendStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// Snapshot of one campaign run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct SendProgress {
    pub sent: u32,
    pub failed: u32,
    pub total: u32,
    pub status: SendStatus,
    /// Recipient of the most recent attempt while the run is active.
    pub current_email: Option<String>,
    /// One `<address>: <reason>` line per failed recipient.
    pub errors: Vec<String>,
}

impl SendProgress {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn processed(&self) -> u32 {
        self.sent + self.failed
    }

    pub fn record_failure(&mut self, email: &str, reason: &str) {
        self.failed += 1;
        self.errors.push(format!("{}: {}", email, reason));
    }

    /// Applies `next` if it is a legal forward move. Returns whether it changed.
    pub fn transition(&mut self, next: SendStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            if next.is_terminal() {
                self.current_email = None;
            }
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        let mut progress = SendProgress::new(3);
        assert!(progress.transition(SendStatus::Sending));
        assert!(!progress.transition(SendStatus::Preparing));
        assert!(progress.transition(SendStatus::Completed));
        assert!(!progress.transition(SendStatus::Sending));
        assert!(!progress.transition(SendStatus::Failed));
        assert_eq!(progress.status, SendStatus::Completed);
    }

    #[test]
    fn preparing_can_fail_or_cancel_directly() {
        let mut progress = SendProgress::new(1);
        assert!(progress.transition(SendStatus::Failed));

        let mut progress = SendProgress::new(1);
        assert!(progress.transition(SendStatus::Cancelled));
    }

    #[test]
    fn failures_are_formatted_per_recipient() {
        let mut progress = SendProgress::new(2);
        progress.record_failure("a@example.com", "mailbox unavailable");
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.errors, vec!["a@example.com: mailbox unavailable"]);
        assert_eq!(progress.processed(), 1);
    }
}
