//! Sliding-tile puzzle. The whole board is one item with a binary score.
//!
//! Tiles are numbered by their home cell, so a solved board is the identity
//! permutation. The highest number is the blank.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::adapters::ChallengeAdapter;
use crate::domain::{ChallengeKind, PuzzleSpec};
use crate::protocol::{ReviewEntry, SubmissionPayload};
use crate::session::{FinishTicket, FinishTrigger, Session};

/// What a completed picture is worth, locally and on the wire. The backend
/// reads it as a "completed" flag.
pub const COMPLETION_SCORE: u32 = 100;

pub const MIN_GRID: usize = 2;
pub const MAX_GRID: usize = 6;

/// Board side length for a puzzle, clamped to something playable.
pub fn resolve_grid(requested: Option<usize>, default_grid: usize) -> usize {
  requested.unwrap_or(default_grid).clamp(MIN_GRID, MAX_GRID)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PuzzleBoard {
  size: usize,
  tiles: Vec<usize>,
}

impl PuzzleBoard {
  pub fn solved(size: usize) -> Self {
    Self { size, tiles: (0..size * size).collect() }
  }

  /// Build a board from an explicit layout; `None` unless it is a permutation
  /// of `0..size*size`.
  pub fn from_tiles(size: usize, tiles: Vec<usize>) -> Option<Self> {
    let mut seen = vec![false; size * size];
    if tiles.len() != seen.len() {
      return None;
    }
    for &t in &tiles {
      if t >= seen.len() || std::mem::replace(&mut seen[t], true) {
        return None;
      }
    }
    Some(Self { size, tiles })
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn tiles(&self) -> &[usize] {
    &self.tiles
  }

  pub fn is_solved(&self) -> bool {
    self.tiles.iter().enumerate().all(|(i, &t)| i == t)
  }

  fn blank_tile(&self) -> usize {
    self.size * self.size - 1
  }

  fn blank_position(&self) -> usize {
    let blank = self.blank_tile();
    self.tiles.iter().position(|&t| t == blank).unwrap_or(blank)
  }

  fn neighbours(&self, position: usize) -> Vec<usize> {
    let (row, col) = (position / self.size, position % self.size);
    let mut out = Vec::with_capacity(4);
    if row > 0 {
      out.push(position - self.size);
    }
    if row + 1 < self.size {
      out.push(position + self.size);
    }
    if col > 0 {
      out.push(position - 1);
    }
    if col + 1 < self.size {
      out.push(position + 1);
    }
    out
  }

  /// Slide the tile at `position` into the blank. Only tiles next to the blank move.
  pub fn slide(&mut self, position: usize) -> bool {
    if position >= self.tiles.len() {
      return false;
    }
    let blank = self.blank_position();
    if !self.neighbours(blank).contains(&position) {
      return false;
    }
    self.tiles.swap(blank, position);
    true
  }

  /// Scramble with legal moves only, so the result is always solvable.
  pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R, moves: usize) {
    let mut previous: Option<usize> = None;
    let mut made = 0;
    while made < moves || (self.is_solved() && self.tiles.len() > 1) {
      let blank = self.blank_position();
      let choices: Vec<usize> = self
        .neighbours(blank)
        .into_iter()
        .filter(|&p| Some(p) != previous)
        .collect();
      let Some(&next) = choices.choose(&mut *rng) else {
        break;
      };
      self.tiles.swap(blank, next);
      previous = Some(blank);
      made += 1;
    }
  }
}

#[derive(Clone, Copy, Debug)]
pub struct PuzzleAdapter {
  pub default_grid: usize,
  pub shuffle_moves: usize,
}

impl ChallengeAdapter for PuzzleAdapter {
  type Item = PuzzleSpec;
  type Answers = PuzzleBoard;

  const KIND: ChallengeKind = ChallengeKind::Puzzle;

  fn initial_answers(&self, items: &[PuzzleSpec]) -> PuzzleBoard {
    let requested = items.first().and_then(|spec| spec.grid_size);
    PuzzleBoard::solved(resolve_grid(requested, self.default_grid))
  }

  fn on_start(&self, _items: &[PuzzleSpec], board: &mut PuzzleBoard) {
    board.shuffle_with(&mut rand::thread_rng(), self.shuffle_moves);
  }

  fn compute_score(&self, _items: &[PuzzleSpec], board: &PuzzleBoard) -> u32 {
    if board.is_solved() {
      COMPLETION_SCORE
    } else {
      0
    }
  }

  fn max_score(&self, _items: &[PuzzleSpec]) -> u32 {
    COMPLETION_SCORE
  }

  fn answered_count(&self, _items: &[PuzzleSpec], board: &PuzzleBoard) -> usize {
    usize::from(board.is_solved())
  }

  fn is_answer_complete(&self, _items: &[PuzzleSpec], board: &PuzzleBoard) -> bool {
    board.is_solved()
  }

  /// The backend only learns whether the picture was completed: the fixed
  /// completion score when solved, 0 when the clock ran out first.
  fn build_submission(&self, _items: &[PuzzleSpec], board: &PuzzleBoard) -> SubmissionPayload {
    let score = if board.is_solved() { COMPLETION_SCORE } else { 0 };
    SubmissionPayload::Puzzle { score }
  }

  fn review(&self, items: &[PuzzleSpec], board: &PuzzleBoard) -> Vec<ReviewEntry> {
    let prompt = items.first().map(|s| s.instruction.clone()).unwrap_or_default();
    let status = |solved: bool| (if solved { "solved" } else { "not solved" }).to_string();
    vec![ReviewEntry {
      index: 0,
      prompt,
      given: status(board.is_solved()),
      expected: status(true),
      correct: board.is_solved(),
    }]
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileMove {
  Ignored,
  Moved,
  /// The move completed the picture and closed the attempt.
  Solved(FinishTicket),
}

impl Session<PuzzleAdapter> {
  pub fn move_tile(&mut self, position: usize) -> Option<TileMove> {
    let moved = self.edit_answers(|_, _, board| board.slide(position))?;
    if !moved {
      return Some(TileMove::Ignored);
    }
    if !self.answers().is_solved() {
      return Some(TileMove::Moved);
    }
    Some(match self.begin_finish(FinishTrigger::LastItem) {
      Some(ticket) => TileMove::Solved(ticket),
      None => TileMove::Moved,
    })
  }
}
