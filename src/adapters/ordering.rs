//! Drag-to-order timeline. The answer is the whole current permutation.
//!
//! Scoring is binary: every position right earns `items.len()`, anything
//! else earns zero.

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::adapters::ChallengeAdapter;
use crate::domain::{ChallengeKind, ItemId, OrderingItem};
use crate::protocol::{OrderingAnswerOut, ReviewEntry, SubmissionPayload};
use crate::session::Session;

/// How many reshuffles we try before accepting an already-solved order.
const SHUFFLE_ATTEMPTS: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct OrderingAdapter {
  pub shuffle: bool,
}

/// Item ids in the order the player currently has them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permutation(pub Vec<ItemId>);

impl Permutation {
  /// Drag the card at `from` and drop it at `to`. Out-of-range moves are ignored.
  pub fn move_item(&mut self, from: usize, to: usize) -> bool {
    let len = self.0.len();
    if from >= len || to >= len || from == to {
      return false;
    }
    let id = self.0.remove(from);
    self.0.insert(to, id);
    true
  }
}

fn correct_order(items: &[OrderingItem]) -> Vec<ItemId> {
  let mut sorted: Vec<&OrderingItem> = items.iter().collect();
  sorted.sort_by_key(|i| i.correct_order);
  sorted.into_iter().map(|i| i.id).collect()
}

fn content_of(items: &[OrderingItem], id: ItemId) -> String {
  items.iter().find(|i| i.id == id).map(|i| i.content.clone()).unwrap_or_default()
}

impl ChallengeAdapter for OrderingAdapter {
  type Item = OrderingItem;
  type Answers = Permutation;

  const KIND: ChallengeKind = ChallengeKind::Ordering;

  fn initial_answers(&self, items: &[OrderingItem]) -> Permutation {
    Permutation(items.iter().map(|i| i.id).collect())
  }

  fn on_start(&self, items: &[OrderingItem], answers: &mut Permutation) {
    if !self.shuffle || items.len() < 2 {
      return;
    }
    let solved = correct_order(items);
    let mut rng = rand::thread_rng();
    for _ in 0..SHUFFLE_ATTEMPTS {
      answers.0.shuffle(&mut rng);
      if answers.0 != solved {
        break;
      }
    }
  }

  fn compute_score(&self, items: &[OrderingItem], answers: &Permutation) -> u32 {
    if !items.is_empty() && answers.0 == correct_order(items) {
      items.len() as u32
    } else {
      0
    }
  }

  fn max_score(&self, items: &[OrderingItem]) -> u32 {
    items.len() as u32
  }

  fn answered_count(&self, items: &[OrderingItem], _answers: &Permutation) -> usize {
    items.len()
  }

  /// A permutation always places every item.
  fn is_answer_complete(&self, items: &[OrderingItem], answers: &Permutation) -> bool {
    answers.0.len() == items.len()
  }

  fn build_submission(&self, _items: &[OrderingItem], answers: &Permutation) -> SubmissionPayload {
    let answers = answers
      .0
      .iter()
      .enumerate()
      .map(|(i, &item_id)| OrderingAnswerOut { item_id, position: i as u32 + 1 })
      .collect();
    SubmissionPayload::Ordering { answers }
  }

  fn review(&self, items: &[OrderingItem], answers: &Permutation) -> Vec<ReviewEntry> {
    correct_order(items)
      .into_iter()
      .enumerate()
      .map(|(index, expected_id)| {
        let given_id = answers.0.get(index).copied();
        ReviewEntry {
          index,
          prompt: format!("Position {}", index + 1),
          given: given_id.map(|id| content_of(items, id)).unwrap_or_default(),
          expected: content_of(items, expected_id),
          correct: given_id == Some(expected_id),
        }
      })
      .collect()
  }
}

impl Session<OrderingAdapter> {
  pub fn move_item(&mut self, from: usize, to: usize) -> Option<bool> {
    self.edit_answers(|_, _, order| order.move_item(from, to))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn items() -> Vec<OrderingItem> {
    // Delivered as A, B, C; history says A, C, B.
    vec![
      OrderingItem { id: 1, content: "A".into(), correct_order: 1 },
      OrderingItem { id: 2, content: "B".into(), correct_order: 3 },
      OrderingItem { id: 3, content: "C".into(), correct_order: 2 },
    ]
  }

  const FIXED: OrderingAdapter = OrderingAdapter { shuffle: false };

  #[test]
  fn near_miss_scores_zero() {
    let order = Permutation(vec![1, 2, 3]);
    assert_eq!(FIXED.compute_score(&items(), &order), 0);
  }

  #[test]
  fn exact_order_scores_item_count() {
    let order = Permutation(vec![1, 3, 2]);
    assert_eq!(FIXED.compute_score(&items(), &order), 3);
    assert_eq!(FIXED.compute_score(&items(), &order), 3);
  }

  #[test]
  fn dragging_fixes_the_order() {
    let mut s = Session::new("ord", items(), FIXED, 180);
    s.start().expect("start");
    assert_eq!(s.answers(), &Permutation(vec![1, 2, 3]));
    assert_eq!(s.move_item(2, 1), Some(true));
    assert_eq!(s.move_item(0, 9), Some(false));
    assert_eq!(s.answers(), &Permutation(vec![1, 3, 2]));
    assert!(s.is_answer_complete());
    let ticket = s.begin_finish(crate::session::FinishTrigger::Manual).expect("ticket");
    assert_eq!(ticket.local_score, 3);
  }

  #[test]
  fn payload_covers_full_permutation_with_one_based_positions() {
    let payload = FIXED.build_submission(&items(), &Permutation(vec![3, 1, 2]));
    assert_eq!(
      payload,
      SubmissionPayload::Ordering {
        answers: vec![
          OrderingAnswerOut { item_id: 3, position: 1 },
          OrderingAnswerOut { item_id: 1, position: 2 },
          OrderingAnswerOut { item_id: 2, position: 3 },
        ]
      }
    );
  }

  #[test]
  fn shuffle_keeps_every_item() {
    let adapter = OrderingAdapter { shuffle: true };
    let mut s = Session::new("ord", items(), adapter, 180);
    s.start().expect("start");
    let mut ids = s.answers().0.clone();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[test]
  fn review_compares_each_position() {
    let rows = FIXED.review(&items(), &Permutation(vec![1, 2, 3]));
    assert_eq!(rows.len(), 3);
    assert!(rows[0].correct);
    assert_eq!((rows[1].given.as_str(), rows[1].expected.as_str()), ("B", "C"));
    assert!(!rows[2].correct);
  }
}
