//! Fill-in-the-blank story: one free-text word per sentence.

use crate::adapters::ChallengeAdapter;
use crate::answers::AnswerSheet;
use crate::domain::{ChallengeKind, FillBlankSentence};
use crate::protocol::{FillBlankAnswerOut, ReviewEntry, SubmissionPayload};
use crate::session::Session;

#[derive(Clone, Copy, Debug, Default)]
pub struct FillBlankAdapter;

fn normalize(word: &str) -> String {
  word.trim().to_lowercase()
}

fn is_filled(answer: &String) -> bool {
  !answer.is_empty()
}

fn is_correct(sentence: &FillBlankSentence, answer: &str) -> bool {
  !answer.trim().is_empty() && normalize(answer) == normalize(&sentence.correct_word)
}

impl ChallengeAdapter for FillBlankAdapter {
  type Item = FillBlankSentence;
  type Answers = AnswerSheet<String>;

  const KIND: ChallengeKind = ChallengeKind::FillBlank;

  fn initial_answers(&self, items: &[FillBlankSentence]) -> AnswerSheet<String> {
    AnswerSheet::new(items.len())
  }

  fn compute_score(&self, items: &[FillBlankSentence], answers: &AnswerSheet<String>) -> u32 {
    items
      .iter()
      .zip(answers.iter())
      .filter(|(s, a)| is_correct(s, a))
      .count() as u32
  }

  fn max_score(&self, items: &[FillBlankSentence]) -> u32 {
    items.len() as u32
  }

  fn answered_count(&self, _items: &[FillBlankSentence], answers: &AnswerSheet<String>) -> usize {
    answers.filled_count(is_filled)
  }

  fn is_answer_complete(&self, _items: &[FillBlankSentence], answers: &AnswerSheet<String>) -> bool {
    answers.is_complete(is_filled)
  }

  fn build_submission(&self, items: &[FillBlankSentence], answers: &AnswerSheet<String>) -> SubmissionPayload {
    let answers = items
      .iter()
      .zip(answers.iter())
      .filter(|(_, a)| is_filled(a))
      .map(|(s, a)| FillBlankAnswerOut { question_id: s.id, answer: a.clone() })
      .collect();
    SubmissionPayload::FillBlank { answers }
  }

  fn review(&self, items: &[FillBlankSentence], answers: &AnswerSheet<String>) -> Vec<ReviewEntry> {
    items
      .iter()
      .zip(answers.iter())
      .enumerate()
      .map(|(index, (s, a))| ReviewEntry {
        index,
        prompt: s.sentence.clone(),
        given: a.clone(),
        expected: s.correct_word.clone(),
        correct: is_correct(s, a),
      })
      .collect()
  }
}

impl Session<FillBlankAdapter> {
  /// Store the trimmed word for one blank. `None` when the attempt is not live,
  /// `Some(false)` when the index is out of range.
  pub fn set_text(&mut self, index: usize, text: &str) -> Option<bool> {
    self.edit_answers(|_, _, answers| answers.set(index, text.trim().to_string()))
  }

  /// Pasting several words at once (newline, tab or `|` separated) fills the
  /// following blanks; extra words are dropped. Returns how many blanks changed.
  pub fn paste_text(&mut self, start: usize, text: &str) -> Option<usize> {
    let parts: Vec<String> = text
      .split(['\n', '\t', '|'])
      .map(|p| p.trim().to_string())
      .filter(|p| !p.is_empty())
      .collect();
    self.edit_answers(|_, _, answers| answers.distribute(start, parts))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::FinishTrigger;

  fn sentence(id: u64, word: &str) -> FillBlankSentence {
    FillBlankSentence { id, sentence: format!("Sentence {id} ___."), correct_word: word.into() }
  }

  fn sheet(values: &[&str]) -> AnswerSheet<String> {
    let mut sheet = AnswerSheet::new(values.len());
    sheet.distribute(0, values.iter().map(|v| v.to_string()));
    sheet
  }

  #[test]
  fn tolerates_case_and_whitespace() {
    let items = vec![sentence(1, "paris")];
    assert_eq!(FillBlankAdapter.compute_score(&items, &sheet(&[" Paris "])), 1);
    assert_eq!(FillBlankAdapter.compute_score(&items, &sheet(&["Pariss"])), 0);
  }

  #[test]
  fn empty_answer_never_matches_empty_word() {
    let items = vec![sentence(1, "")];
    assert_eq!(FillBlankAdapter.compute_score(&items, &sheet(&[""])), 0);
  }

  #[test]
  fn scoring_is_idempotent() {
    let items = vec![sentence(1, "red"), sentence(2, "blue"), sentence(3, "green")];
    let answers = sheet(&["RED", "", "green "]);
    let first = FillBlankAdapter.compute_score(&items, &answers);
    assert_eq!(first, 2);
    assert_eq!(FillBlankAdapter.compute_score(&items, &answers), first);
  }

  #[test]
  fn payload_omits_unanswered() {
    let items = vec![sentence(1, "a"), sentence(2, "b")];
    let payload = FillBlankAdapter.build_submission(&items, &sheet(&["", "b"]));
    assert_eq!(
      payload,
      SubmissionPayload::FillBlank { answers: vec![FillBlankAnswerOut { question_id: 2, answer: "b".into() }] }
    );
  }

  #[test]
  fn session_input_is_trimmed_and_bounded() {
    let items = vec![sentence(1, "one"), sentence(2, "two"), sentence(3, "three")];
    let mut s = Session::new("fb", items, FillBlankAdapter, 180);
    s.start().expect("start");

    assert_eq!(s.set_text(0, "  One "), Some(true));
    assert_eq!(s.set_text(7, "ghost"), Some(false));
    assert_eq!(s.answers().get(0).map(String::as_str), Some("One"));
    assert_eq!(s.answers().len(), 3);

    assert_eq!(s.paste_text(1, "two\nthree\nfour"), Some(2));
    assert!(s.is_answer_complete());

    let ticket = s.begin_finish(FinishTrigger::Manual).expect("ticket");
    assert_eq!(ticket.local_score, 3);
  }
}
