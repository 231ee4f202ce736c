//! Request lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle of a balance-affecting request.
///
/// Every request passes through `Received` and `Validating` and ends
/// in exactly one terminal state. There are no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestState {
    /// The request has been accepted for processing.
    Received,
    /// Business checks are running under the owner locks.
    Validating,
    /// All effects are applied and the ledger entry is written.
    Committed,
    /// A business check failed; no balances changed.
    Rejected,
}

impl RequestState {
    /// Whether the request has finished processing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Committed | RequestState::Rejected)
    }

    /// Canonical uppercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Received => "RECEIVED",
            RequestState::Validating => "VALIDATING",
            RequestState::Committed => "COMMITTED",
            RequestState::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!RequestState::Received.is_terminal());
        assert!(!RequestState::Validating.is_terminal());
        assert!(RequestState::Committed.is_terminal());
        assert!(RequestState::Rejected.is_terminal());
    }

    #[test]
    fn serializes_uppercase() {
        let json = serde_json::to_string(&RequestState::Committed).unwrap();
        assert_eq!(json, "\"COMMITTED\"");
        let state: RequestState = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(state, RequestState::Rejected);
    }
}
