//! Domain models delivered by the backend: challenge kinds and their items.
//!
//! The engine treats a fetched `ChallengeDetail` as already validated. Fields
//! the backend may hide (correct flags, correct words) default to "unknown",
//! which simply makes the local score pessimistic.

use serde::{Deserialize, Serialize};

pub type ItemId = u64;
pub type OptionId = u64;

/// Which mini-game is this challenge?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
  Quiz,
  Ordering,
  FillBlank,
  Puzzle,
}

impl ChallengeKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ChallengeKind::Quiz => "quiz",
      ChallengeKind::Ordering => "ordering",
      ChallengeKind::FillBlank => "fill_blank",
      ChallengeKind::Puzzle => "puzzle",
    }
  }
}

impl std::fmt::Display for ChallengeKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Full challenge payload as returned by `GET /challenges/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeDetail {
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(flatten)]
  pub content: ChallengeContent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChallengeContent {
  Quiz { questions: Vec<QuizQuestion> },
  Ordering { items: Vec<OrderingItem> },
  FillBlank { sentences: Vec<FillBlankSentence> },
  Puzzle(PuzzleSpec),
}

impl ChallengeDetail {
  pub fn kind(&self) -> ChallengeKind {
    match &self.content {
      ChallengeContent::Quiz { .. } => ChallengeKind::Quiz,
      ChallengeContent::Ordering { .. } => ChallengeKind::Ordering,
      ChallengeContent::FillBlank { .. } => ChallengeKind::FillBlank,
      ChallengeContent::Puzzle(_) => ChallengeKind::Puzzle,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
  pub id: ItemId,
  pub text: String,
  /// Multi-select question (checkboxes) rather than a single radio choice.
  #[serde(default)]
  pub multiple: bool,
  pub options: Vec<QuizOption>,
}

impl QuizQuestion {
  pub fn has_option(&self, option: OptionId) -> bool {
    self.options.iter().any(|o| o.id == option)
  }

  pub fn correct_ids(&self) -> impl Iterator<Item = OptionId> + '_ {
    self.options.iter().filter(|o| o.is_correct).map(|o| o.id)
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizOption {
  pub id: OptionId,
  pub text: String,
  #[serde(default)]
  pub is_correct: bool,
}

/// One card of the drag-to-order timeline. `correct_order` is 1-based.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderingItem {
  pub id: ItemId,
  pub content: String,
  pub correct_order: u32,
}

/// Sentence with a blank; `correct_word` fills it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FillBlankSentence {
  pub id: ItemId,
  pub sentence: String,
  #[serde(default)]
  pub correct_word: String,
}

/// The whole sliding-tile puzzle is a single item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PuzzleSpec {
  #[serde(default)]
  pub instruction: String,
  #[serde(default)]
  pub image_url: String,
  /// Board side length; falls back to the configured default when absent.
  #[serde(default)]
  pub grid_size: Option<usize>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quiz_detail_parses_with_hidden_flags() {
    let json = r#"{
      "id": "42",
      "title": "Capitals",
      "type": "quiz",
      "questions": [
        { "id": 1, "text": "Capital of France?", "options": [
          { "id": 10, "text": "Paris", "is_correct": true },
          { "id": 11, "text": "Lyon" }
        ]}
      ]
    }"#;
    let detail: ChallengeDetail = serde_json::from_str(json).expect("detail");
    assert_eq!(detail.kind(), ChallengeKind::Quiz);
    let ChallengeContent::Quiz { questions } = &detail.content else {
      panic!("expected quiz content");
    };
    assert!(!questions[0].multiple);
    assert_eq!(questions[0].correct_ids().collect::<Vec<_>>(), vec![10]);
    assert!(!questions[0].options[1].is_correct);
  }

  #[test]
  fn puzzle_detail_parses_without_grid() {
    let json = r#"{ "id": "p1", "type": "puzzle", "instruction": "Rebuild the vase", "image_url": "/m/vase.png" }"#;
    let detail: ChallengeDetail = serde_json::from_str(json).expect("detail");
    assert_eq!(detail.kind(), ChallengeKind::Puzzle);
    assert_eq!(detail.title, "");
    match detail.content {
      ChallengeContent::Puzzle(spec) => {
        assert_eq!(spec.grid_size, None);
        assert_eq!(spec.instruction, "Rebuild the vase");
      }
      other => panic!("unexpected content: {other:?}"),
    }
  }
}
