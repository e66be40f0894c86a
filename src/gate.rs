//! Submission gate: guarantees at most one backend submission per attempt.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// Backend accepted the attempt and returned its authoritative score.
    Confirmed { score: u32 },
    /// Network or server error; the local score stands in.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionGate {
    #[default]
    Open,
    Pending,
    Settled(SubmissionOutcome),
}

impl SubmissionGate {
    /// Claim the single submission slot. Only the first caller gets `true`.
    pub fn try_begin(&mut self) -> bool {
        if *self == SubmissionGate::Open {
            *self = SubmissionGate::Pending;
            true
        } else {
            false
        }
    }

    /// Record how the in-flight submission ended. Ignored unless pending, so a
    /// late or duplicated resolution cannot overwrite the first one.
    pub fn settle(&mut self, outcome: SubmissionOutcome) -> bool {
        if *self == SubmissionGate::Pending {
            *self = SubmissionGate::Settled(outcome);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionGate::Pending)
    }

    pub fn outcome(&self) -> Option<SubmissionOutcome> {
        match self {
            SubmissionGate::Settled(o) => Some(*o),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_begin_wins() {
        let mut gate = SubmissionGate::default();
        assert!(gate.try_begin());
        assert!(!gate.try_begin());
        assert!(gate.is_pending());
    }

    #[test]
    fn settles_once() {
        let mut gate = SubmissionGate::default();
        assert!(!gate.settle(SubmissionOutcome::Failed), "cannot settle before begin");
        gate.try_begin();
        assert!(gate.settle(SubmissionOutcome::Confirmed { score: 7 }));
        assert!(!gate.settle(SubmissionOutcome::Failed));
        assert_eq!(gate.outcome(), Some(SubmissionOutcome::Confirmed { score: 7 }));
        assert!(!gate.try_begin(), "settled gate never reopens");
    }
}
