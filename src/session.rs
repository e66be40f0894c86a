//! The attempt state machine, generic over a challenge adapter.
//!
//! ```text
//! NotStarted --start--> InProgress --finish trigger--> Finishing --settle--> Submitted
//!                                                                 Submitted <--back-- Reviewing
//!                                                                 Submitted --view_answers--> Reviewing
//! Submitted | Reviewing --restart--> (fresh Session) NotStarted
//! ```
//!
//! `Session` is synchronous and owns no tasks. The countdown and the network
//! call live in `play`, which feeds their results back in here.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::ChallengeAdapter;
use crate::gate::{SubmissionGate, SubmissionOutcome};
use crate::protocol::{ResultView, ReviewEntry, SubmissionPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Finishing,
    Submitted,
    Reviewing,
}

/// What closed the attempt. All three share one scoring path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishTrigger {
    TimeUp,
    Manual,
    LastItem,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("challenge has no items to play")]
    NoItems,
    #[error("cannot {action} while the attempt is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

/// Everything the submitter needs, handed out exactly once per attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishTicket {
    pub attempt_id: Uuid,
    pub challenge_id: String,
    pub trigger: FinishTrigger,
    pub local_score: u32,
    pub payload: SubmissionPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved(usize),
    Finished(FinishTicket),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Session<A: ChallengeAdapter> {
    attempt_id: Uuid,
    challenge_id: String,
    adapter: A,
    items: Vec<A::Item>,
    answers: A::Answers,
    cursor: usize,
    budget_secs: u32,
    remaining_secs: u32,
    state: SessionState,
    local_score: Option<u32>,
    server_score: Option<u32>,
    gate: SubmissionGate,
    trigger: Option<FinishTrigger>,
}

impl<A: ChallengeAdapter> Session<A> {
    pub fn new(challenge_id: impl Into<String>, items: Vec<A::Item>, adapter: A, budget_secs: u32) -> Self {
        let answers = adapter.initial_answers(&items);
        Self {
            attempt_id: Uuid::new_v4(),
            challenge_id: challenge_id.into(),
            adapter,
            items,
            answers,
            cursor: 0,
            budget_secs,
            remaining_secs: budget_secs,
            state: SessionState::NotStarted,
            local_score: None,
            server_score: None,
            gate: SubmissionGate::Open,
            trigger: None,
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn challenge_id(&self) -> &str {
        &self.challenge_id
    }

    pub fn items(&self) -> &[A::Item] {
        &self.items
    }

    pub fn answers(&self) -> &A::Answers {
        &self.answers
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn budget_secs(&self) -> u32 {
        self.budget_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn local_score(&self) -> Option<u32> {
        self.local_score
    }

    pub fn server_score(&self) -> Option<u32> {
        self.server_score
    }

    pub fn trigger(&self) -> Option<FinishTrigger> {
        self.trigger
    }

    pub fn is_submitting(&self) -> bool {
        self.gate.is_pending()
    }

    /// Authoritative score when the backend confirmed one, local otherwise.
    pub fn displayed_score(&self) -> Option<u32> {
        self.server_score.or(self.local_score)
    }

    pub fn answered_count(&self) -> usize {
        self.adapter.answered_count(&self.items, &self.answers)
    }

    pub fn is_answer_complete(&self) -> bool {
        self.adapter.is_answer_complete(&self.items, &self.answers)
    }

    pub fn answers_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.answers).unwrap_or(serde_json::Value::Null)
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::NotStarted {
            return Err(self.invalid("start"));
        }
        if self.items.is_empty() {
            return Err(SessionError::NoItems);
        }
        self.adapter.on_start(&self.items, &mut self.answers);
        self.state = SessionState::InProgress;
        info!(
            target: "session",
            attempt = %self.attempt_id,
            challenge = %self.challenge_id,
            kind = %A::KIND,
            items = self.items.len(),
            budget = self.budget_secs,
            "Attempt started"
        );
        Ok(())
    }

    /// Apply a countdown reading. Ignored outside InProgress; never raises the
    /// remaining time.
    pub fn on_tick(&mut self, remaining: u32) -> bool {
        if self.state != SessionState::InProgress {
            return false;
        }
        self.remaining_secs = self.remaining_secs.min(remaining);
        true
    }

    /// Run `f` against the answers, but only while the attempt is live.
    pub(crate) fn edit_answers<R>(
        &mut self,
        f: impl FnOnce(&A, &[A::Item], &mut A::Answers) -> R,
    ) -> Option<R> {
        if self.state != SessionState::InProgress {
            debug!(target: "session", attempt = %self.attempt_id, state = ?self.state, "Answer edit ignored");
            return None;
        }
        Some(f(&self.adapter, &self.items, &mut self.answers))
    }

    pub fn goto(&mut self, index: usize) -> bool {
        if self.state != SessionState::InProgress || index >= self.items.len() {
            return false;
        }
        self.cursor = index;
        true
    }

    pub fn prev(&mut self) -> bool {
        match self.cursor.checked_sub(1) {
            Some(index) => self.goto(index),
            None => false,
        }
    }

    /// Move to the next item; moving past the last one finishes the attempt.
    pub fn next(&mut self) -> Advance {
        if self.state != SessionState::InProgress {
            return Advance::Ignored;
        }
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
            return Advance::Moved(self.cursor);
        }
        match self.begin_finish(FinishTrigger::LastItem) {
            Some(ticket) => Advance::Finished(ticket),
            None => Advance::Ignored,
        }
    }

    /// The single InProgress -> Finishing path. Returns `None` for every
    /// trigger after the first, so callers never submit twice.
    pub fn begin_finish(&mut self, trigger: FinishTrigger) -> Option<FinishTicket> {
        if self.state != SessionState::InProgress || !self.gate.try_begin() {
            debug!(
                target: "session",
                attempt = %self.attempt_id,
                ?trigger,
                state = ?self.state,
                "Finish trigger collapsed"
            );
            return None;
        }

        let local_score = self.adapter.compute_score(&self.items, &self.answers);
        let payload = self.adapter.build_submission(&self.items, &self.answers);
        self.local_score = Some(local_score);
        self.trigger = Some(trigger);
        self.state = SessionState::Finishing;

        info!(
            target: "session",
            attempt = %self.attempt_id,
            challenge = %self.challenge_id,
            ?trigger,
            local_score,
            remaining = self.remaining_secs,
            "Attempt finishing"
        );

        Some(FinishTicket {
            attempt_id: self.attempt_id,
            challenge_id: self.challenge_id.clone(),
            trigger,
            local_score,
            payload,
        })
    }

    /// Record the submission result and land in Submitted either way.
    pub fn settle(&mut self, outcome: SubmissionOutcome) -> Result<ResultView, SessionError> {
        if self.state != SessionState::Finishing || !self.gate.settle(outcome) {
            return Err(self.invalid("settle"));
        }
        match outcome {
            SubmissionOutcome::Confirmed { score } => {
                self.server_score = Some(score);
                info!(target: "session", attempt = %self.attempt_id, server_score = score, "Submission confirmed");
            }
            SubmissionOutcome::Failed => {
                warn!(
                    target: "session",
                    attempt = %self.attempt_id,
                    local_score = ?self.local_score,
                    "Submission failed; showing local score"
                );
            }
        }
        self.state = SessionState::Submitted;
        self.result_view().ok_or_else(|| self.invalid("settle"))
    }

    pub fn result_view(&self) -> Option<ResultView> {
        if !matches!(self.state, SessionState::Submitted | SessionState::Reviewing) {
            return None;
        }
        let local_score = self.local_score?;
        Some(ResultView {
            attempt_id: self.attempt_id,
            challenge_id: self.challenge_id.clone(),
            kind: A::KIND,
            trigger: self.trigger?,
            local_score,
            server_score: self.server_score,
            score: self.server_score.unwrap_or(local_score),
            max_score: self.adapter.max_score(&self.items),
            answered: self.answered_count(),
            total: self.items.len(),
            submission: self.gate.outcome()?,
        })
    }

    pub fn view_answers(&mut self) -> Result<Vec<ReviewEntry>, SessionError> {
        if self.state != SessionState::Submitted {
            return Err(self.invalid("view answers"));
        }
        self.state = SessionState::Reviewing;
        Ok(self.adapter.review(&self.items, &self.answers))
    }

    pub fn back(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Reviewing {
            return Err(self.invalid("go back"));
        }
        self.state = SessionState::Submitted;
        Ok(())
    }

    /// A brand new attempt over the same items: full budget, cleared answers.
    pub fn restart(&self) -> Result<Self, SessionError> {
        if !matches!(self.state, SessionState::Submitted | SessionState::Reviewing) {
            return Err(self.invalid("restart"));
        }
        let fresh = Self::new(self.challenge_id.clone(), self.items.clone(), self.adapter.clone(), self.budget_secs);
        info!(target: "session", previous = %self.attempt_id, attempt = %fresh.attempt_id, "Attempt restarted");
        Ok(fresh)
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition { action, state: self.state }
    }
}
