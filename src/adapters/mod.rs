//! Per-challenge-type behavior plugged into the generic `Session`.
//!
//! An adapter knows how to score its answers, what "complete" means, how the
//! backend wants the answers shaped, and how to lay them out for review.
//! Scoring must be pure: same items and answers, same score.

pub mod fill_blank;
pub mod ordering;
pub mod puzzle;
pub mod quiz;

use serde::Serialize;

use crate::domain::ChallengeKind;
use crate::protocol::{ReviewEntry, SubmissionPayload};

pub trait ChallengeAdapter: Clone + std::fmt::Debug + Send + Sync + 'static {
  type Item: Clone + std::fmt::Debug + Send + Sync;
  type Answers: Clone + std::fmt::Debug + Send + Sync + Serialize;

  const KIND: ChallengeKind;

  /// Answers for a brand new attempt: every item present, nothing answered.
  fn initial_answers(&self, items: &[Self::Item]) -> Self::Answers;

  /// Called once on NotStarted -> InProgress (ordering and puzzle scramble here).
  fn on_start(&self, _items: &[Self::Item], _answers: &mut Self::Answers) {}

  fn compute_score(&self, items: &[Self::Item], answers: &Self::Answers) -> u32;

  fn max_score(&self, items: &[Self::Item]) -> u32;

  fn answered_count(&self, items: &[Self::Item], answers: &Self::Answers) -> usize;

  fn is_answer_complete(&self, items: &[Self::Item], answers: &Self::Answers) -> bool;

  fn build_submission(&self, items: &[Self::Item], answers: &Self::Answers) -> SubmissionPayload;

  fn review(&self, items: &[Self::Item], answers: &Self::Answers) -> Vec<ReviewEntry>;
}
