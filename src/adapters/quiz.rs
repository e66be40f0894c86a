//! Quiz: single and multi choice questions.
//!
//! A question scores only when the selected set equals the correct set;
//! multi-select gets no partial credit.

use std::collections::BTreeSet;

use crate::adapters::ChallengeAdapter;
use crate::answers::AnswerSheet;
use crate::domain::{ChallengeKind, OptionId, QuizQuestion};
use crate::protocol::{QuizAnswerOut, ReviewEntry, SubmissionPayload};
use crate::session::Session;

pub type Selection = BTreeSet<OptionId>;

#[derive(Clone, Copy, Debug, Default)]
pub struct QuizAdapter;

fn is_filled(selection: &Selection) -> bool {
  !selection.is_empty()
}

fn is_correct(question: &QuizQuestion, selection: &Selection) -> bool {
  let correct: Selection = question.correct_ids().collect();
  !correct.is_empty() && &correct == selection
}

fn option_texts(question: &QuizQuestion, ids: impl Iterator<Item = OptionId>) -> String {
  let wanted: Selection = ids.collect();
  question
    .options
    .iter()
    .filter(|o| wanted.contains(&o.id))
    .map(|o| o.text.as_str())
    .collect::<Vec<_>>()
    .join(", ")
}

impl ChallengeAdapter for QuizAdapter {
  type Item = QuizQuestion;
  type Answers = AnswerSheet<Selection>;

  const KIND: ChallengeKind = ChallengeKind::Quiz;

  fn initial_answers(&self, items: &[QuizQuestion]) -> AnswerSheet<Selection> {
    AnswerSheet::new(items.len())
  }

  fn compute_score(&self, items: &[QuizQuestion], answers: &AnswerSheet<Selection>) -> u32 {
    items
      .iter()
      .zip(answers.iter())
      .filter(|(q, sel)| is_correct(q, sel))
      .count() as u32
  }

  fn max_score(&self, items: &[QuizQuestion]) -> u32 {
    items.len() as u32
  }

  fn answered_count(&self, _items: &[QuizQuestion], answers: &AnswerSheet<Selection>) -> usize {
    answers.filled_count(is_filled)
  }

  fn is_answer_complete(&self, _items: &[QuizQuestion], answers: &AnswerSheet<Selection>) -> bool {
    answers.is_complete(is_filled)
  }

  fn build_submission(&self, items: &[QuizQuestion], answers: &AnswerSheet<Selection>) -> SubmissionPayload {
    let answers = items
      .iter()
      .zip(answers.iter())
      .flat_map(|(q, sel)| sel.iter().map(move |&answer_id| QuizAnswerOut { question_id: q.id, answer_id }))
      .collect();
    SubmissionPayload::Quiz { answers }
  }

  fn review(&self, items: &[QuizQuestion], answers: &AnswerSheet<Selection>) -> Vec<ReviewEntry> {
    items
      .iter()
      .zip(answers.iter())
      .enumerate()
      .map(|(index, (q, sel))| ReviewEntry {
        index,
        prompt: q.text.clone(),
        given: option_texts(q, sel.iter().copied()),
        expected: option_texts(q, q.correct_ids()),
        correct: is_correct(q, sel),
      })
      .collect()
  }
}

impl Session<QuizAdapter> {
  /// Radio-style pick: replaces the selection on single-choice questions,
  /// adds to it on multi-choice ones. Unknown questions or options are ignored.
  pub fn select_option(&mut self, question: usize, option: OptionId) -> Option<bool> {
    self.edit_answers(|_, items, answers| {
      let Some(q) = items.get(question).filter(|q| q.has_option(option)) else {
        return false;
      };
      let multiple = q.multiple;
      match answers.get_mut(question) {
        Some(sel) if multiple => {
          sel.insert(option);
          true
        }
        Some(sel) => {
          sel.clear();
          sel.insert(option);
          true
        }
        None => false,
      }
    })
  }

  /// Checkbox-style flip. On single-choice questions a second click on the
  /// selected option clears the answer.
  pub fn toggle_option(&mut self, question: usize, option: OptionId) -> Option<bool> {
    self.edit_answers(|_, items, answers| {
      let Some(q) = items.get(question).filter(|q| q.has_option(option)) else {
        return false;
      };
      let multiple = q.multiple;
      let Some(sel) = answers.get_mut(question) else {
        return false;
      };
      if sel.remove(&option) {
        return true;
      }
      if !multiple {
        sel.clear();
      }
      sel.insert(option);
      true
    })
  }
}
