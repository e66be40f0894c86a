//! One player's attempt, driven by a single event loop.
//!
//! `PlayerSession` owns the active session, its countdown and the sending half
//! of the submission channel. The WebSocket loop feeds it three event sources
//! (player commands, countdown events, submission results) one at a time, so
//! session state is only ever touched from that loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::fill_blank::FillBlankAdapter;
use crate::adapters::ordering::OrderingAdapter;
use crate::adapters::puzzle::{PuzzleAdapter, TileMove};
use crate::adapters::quiz::QuizAdapter;
use crate::backend::ChallengeBackend;
use crate::config::SessionConfig;
use crate::domain::{ChallengeContent, ChallengeDetail, ChallengeKind};
use crate::gate::SubmissionOutcome;
use crate::protocol::{ClientMessage, ResultView, ReviewEntry, ServerMessage};
use crate::session::{Advance, FinishTicket, FinishTrigger, Session, SessionError, SessionState};
use crate::timer::{format_clock, Countdown, TimerEvent};

/// The session of whichever challenge type was fetched.
#[derive(Debug, Clone)]
pub enum ActiveSession {
  Quiz(Session<QuizAdapter>),
  Ordering(Session<OrderingAdapter>),
  FillBlank(Session<FillBlankAdapter>),
  Puzzle(Session<PuzzleAdapter>),
}

macro_rules! with_session {
  ($active:expr, $s:ident => $body:expr) => {
    match $active {
      ActiveSession::Quiz($s) => $body,
      ActiveSession::Ordering($s) => $body,
      ActiveSession::FillBlank($s) => $body,
      ActiveSession::Puzzle($s) => $body,
    }
  };
}

impl ActiveSession {
  pub fn from_detail(detail: &ChallengeDetail, cfg: &SessionConfig) -> Self {
    let id = detail.id.clone();
    let budget = cfg.time_budget_secs;
    match &detail.content {
      ChallengeContent::Quiz { questions } => Self::Quiz(Session::new(id, questions.clone(), QuizAdapter, budget)),
      ChallengeContent::Ordering { items } => {
        let adapter = OrderingAdapter { shuffle: cfg.shuffle_ordering };
        Self::Ordering(Session::new(id, items.clone(), adapter, budget))
      }
      ChallengeContent::FillBlank { sentences } => {
        Self::FillBlank(Session::new(id, sentences.clone(), FillBlankAdapter, budget))
      }
      ChallengeContent::Puzzle(spec) => {
        let adapter = PuzzleAdapter {
          default_grid: cfg.puzzle_grid,
          shuffle_moves: cfg.puzzle_shuffle_moves,
        };
        Self::Puzzle(Session::new(id, vec![spec.clone()], adapter, budget))
      }
    }
  }

  pub fn kind(&self) -> ChallengeKind {
    match self {
      ActiveSession::Quiz(_) => ChallengeKind::Quiz,
      ActiveSession::Ordering(_) => ChallengeKind::Ordering,
      ActiveSession::FillBlank(_) => ChallengeKind::FillBlank,
      ActiveSession::Puzzle(_) => ChallengeKind::Puzzle,
    }
  }

  pub fn state(&self) -> SessionState {
    with_session!(self, s => s.state())
  }

  pub fn attempt_id(&self) -> Uuid {
    with_session!(self, s => s.attempt_id())
  }

  pub fn budget_secs(&self) -> u32 {
    with_session!(self, s => s.budget_secs())
  }

  pub fn remaining_secs(&self) -> u32 {
    with_session!(self, s => s.remaining_secs())
  }

  pub fn answers_json(&self) -> serde_json::Value {
    with_session!(self, s => s.answers_json())
  }

  pub fn answered_count(&self) -> usize {
    with_session!(self, s => s.answered_count())
  }

  pub fn is_answer_complete(&self) -> bool {
    with_session!(self, s => s.is_answer_complete())
  }

  pub fn start(&mut self) -> Result<(), SessionError> {
    with_session!(self, s => s.start())
  }

  pub fn on_tick(&mut self, remaining: u32) -> bool {
    with_session!(self, s => s.on_tick(remaining))
  }

  pub fn goto(&mut self, index: usize) -> bool {
    with_session!(self, s => s.goto(index))
  }

  pub fn prev(&mut self) -> bool {
    with_session!(self, s => s.prev())
  }

  pub fn cursor(&self) -> usize {
    with_session!(self, s => s.cursor())
  }

  pub fn next(&mut self) -> Advance {
    with_session!(self, s => s.next())
  }

  pub fn begin_finish(&mut self, trigger: FinishTrigger) -> Option<FinishTicket> {
    with_session!(self, s => s.begin_finish(trigger))
  }

  pub fn settle(&mut self, outcome: SubmissionOutcome) -> Result<ResultView, SessionError> {
    with_session!(self, s => s.settle(outcome))
  }

  pub fn result_view(&self) -> Option<ResultView> {
    with_session!(self, s => s.result_view())
  }

  pub fn view_answers(&mut self) -> Result<Vec<ReviewEntry>, SessionError> {
    with_session!(self, s => s.view_answers())
  }

  pub fn back(&mut self) -> Result<(), SessionError> {
    with_session!(self, s => s.back())
  }

  pub fn restart(&self) -> Result<Self, SessionError> {
    Ok(match self {
      ActiveSession::Quiz(s) => ActiveSession::Quiz(s.restart()?),
      ActiveSession::Ordering(s) => ActiveSession::Ordering(s.restart()?),
      ActiveSession::FillBlank(s) => ActiveSession::FillBlank(s.restart()?),
      ActiveSession::Puzzle(s) => ActiveSession::Puzzle(s.restart()?),
    })
  }
}

/// Result of a submission task, tagged with the attempt it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionDone {
  pub attempt_id: Uuid,
  pub outcome: SubmissionOutcome,
}

pub struct PlayerSession {
  active: ActiveSession,
  countdown: Option<Countdown>,
  backend: Arc<dyn ChallengeBackend>,
  submit_tx: mpsc::UnboundedSender<SubmissionDone>,
}

impl PlayerSession {
  pub fn new(
    detail: &ChallengeDetail,
    cfg: &SessionConfig,
    backend: Arc<dyn ChallengeBackend>,
  ) -> (Self, mpsc::UnboundedReceiver<SubmissionDone>) {
    let (submit_tx, submit_rx) = mpsc::unbounded_channel();
    let player = Self { active: ActiveSession::from_detail(detail, cfg), countdown: None, backend, submit_tx };
    (player, submit_rx)
  }

  pub fn active(&self) -> &ActiveSession {
    &self.active
  }

  pub fn timer_running(&self) -> bool {
    self.countdown.is_some()
  }

  /// Next countdown event; pends forever while no countdown is running.
  pub async fn next_timer_event(&mut self) -> Option<TimerEvent> {
    match self.countdown.as_mut() {
      Some(countdown) => countdown.recv().await,
      None => std::future::pending().await,
    }
  }

  pub fn handle(&mut self, msg: ClientMessage) -> Vec<ServerMessage> {
    match msg {
      ClientMessage::Ping => vec![ServerMessage::Pong],
      ClientMessage::Start => self.start(),

      ClientMessage::SelectOption { question, option } => {
        let changed = match &mut self.active {
          ActiveSession::Quiz(s) => s.select_option(question, option),
          _ => self.wrong_kind("select_option"),
        };
        self.edited(changed)
      }
      ClientMessage::ToggleOption { question, option } => {
        let changed = match &mut self.active {
          ActiveSession::Quiz(s) => s.toggle_option(question, option),
          _ => self.wrong_kind("toggle_option"),
        };
        self.edited(changed)
      }
      ClientMessage::MoveItem { from, to } => {
        let changed = match &mut self.active {
          ActiveSession::Ordering(s) => s.move_item(from, to),
          _ => self.wrong_kind("move_item"),
        };
        self.edited(changed)
      }
      ClientMessage::SetText { index, text } => {
        let changed = match &mut self.active {
          ActiveSession::FillBlank(s) => s.set_text(index, &text),
          _ => self.wrong_kind("set_text"),
        };
        self.edited(changed)
      }
      ClientMessage::PasteText { start, text } => {
        let changed = match &mut self.active {
          ActiveSession::FillBlank(s) => s.paste_text(start, &text).map(|n| n > 0),
          _ => self.wrong_kind("paste_text"),
        };
        self.edited(changed)
      }
      ClientMessage::MoveTile { position } => {
        let moved = match &mut self.active {
          ActiveSession::Puzzle(s) => s.move_tile(position),
          _ => self.wrong_kind("move_tile"),
        };
        match moved {
          Some(TileMove::Moved) => vec![self.answers_msg()],
          Some(TileMove::Solved(ticket)) => {
            let mut out = vec![self.answers_msg()];
            out.extend(self.submit(ticket));
            out
          }
          Some(TileMove::Ignored) | None => Vec::new(),
        }
      }

      ClientMessage::Goto { index } => {
        if self.active.goto(index) {
          vec![ServerMessage::Cursor { index }]
        } else {
          Vec::new()
        }
      }
      ClientMessage::Prev => {
        if self.active.prev() {
          vec![ServerMessage::Cursor { index: self.active.cursor() }]
        } else {
          Vec::new()
        }
      }
      ClientMessage::Next => match self.active.next() {
        Advance::Moved(index) => vec![ServerMessage::Cursor { index }],
        Advance::Finished(ticket) => self.submit(ticket),
        Advance::Ignored => Vec::new(),
      },
      ClientMessage::Finish => match self.active.begin_finish(FinishTrigger::Manual) {
        Some(ticket) => self.submit(ticket),
        None => Vec::new(),
      },

      ClientMessage::ViewAnswers => match self.active.view_answers() {
        Ok(entries) => vec![ServerMessage::Review { entries }],
        Err(e) => vec![error_msg(e)],
      },
      ClientMessage::Back => match self.active.back() {
        Ok(()) => vec![ServerMessage::State { state: self.active.state() }],
        Err(e) => vec![error_msg(e)],
      },
      ClientMessage::Restart => match self.active.restart() {
        Ok(fresh) => {
          self.countdown = None;
          self.active = fresh;
          vec![ServerMessage::State { state: self.active.state() }]
        }
        Err(e) => vec![error_msg(e)],
      },
    }
  }

  pub fn on_timer(&mut self, event: TimerEvent) -> Vec<ServerMessage> {
    match event {
      TimerEvent::Tick { remaining } => {
        if self.active.on_tick(remaining) {
          let remaining_seconds = self.active.remaining_secs();
          vec![ServerMessage::Tick { remaining_seconds, clock: format_clock(remaining_seconds) }]
        } else {
          Vec::new()
        }
      }
      TimerEvent::Expired => {
        self.countdown = None;
        match self.active.begin_finish(FinishTrigger::TimeUp) {
          Some(ticket) => self.submit(ticket),
          None => Vec::new(),
        }
      }
    }
  }

  pub fn on_submission(&mut self, done: SubmissionDone) -> Vec<ServerMessage> {
    if done.attempt_id != self.active.attempt_id() {
      debug!(target: "session", attempt = %done.attempt_id, "Dropping result of a superseded attempt");
      return Vec::new();
    }
    match self.active.settle(done.outcome) {
      Ok(result) => vec![ServerMessage::Result { result }],
      Err(e) => {
        warn!(target: "session", attempt = %done.attempt_id, error = %e, "Unexpected submission result");
        Vec::new()
      }
    }
  }

  /// Player left. Cancels the countdown; an unfinished attempt is dropped unsubmitted.
  pub fn exit(self) {
    let state = self.active.state();
    if state == SessionState::InProgress {
      info!(
        target: "session",
        attempt = %self.active.attempt_id(),
        remaining = self.active.remaining_secs(),
        "Attempt abandoned"
      );
    }
  }

  fn start(&mut self) -> Vec<ServerMessage> {
    if let Err(e) = self.active.start() {
      return vec![error_msg(e)];
    }
    self.countdown = Some(Countdown::start(self.active.budget_secs()));
    let remaining_seconds = self.active.remaining_secs();
    vec![ServerMessage::Started {
      attempt_id: self.active.attempt_id(),
      remaining_seconds,
      clock: format_clock(remaining_seconds),
      answers: self.active.answers_json(),
    }]
  }

  /// Stop the clock and send the attempt off. Only ever reached with a ticket,
  /// and the session hands out one ticket per attempt.
  #[instrument(level = "debug", skip(self, ticket), fields(attempt = %ticket.attempt_id))]
  fn submit(&mut self, ticket: FinishTicket) -> Vec<ServerMessage> {
    self.countdown = None;

    let backend = self.backend.clone();
    let tx = self.submit_tx.clone();
    let FinishTicket { attempt_id, challenge_id, trigger, local_score, payload } = ticket;
    tokio::spawn(async move {
      let outcome = match backend.submit_attempt(&challenge_id, &payload).await {
        Ok(score) => SubmissionOutcome::Confirmed { score },
        Err(e) => {
          warn!(target: "session", attempt = %attempt_id, %challenge_id, error = %e, "Submission failed");
          SubmissionOutcome::Failed
        }
      };
      if tx.send(SubmissionDone { attempt_id, outcome }).is_err() {
        debug!(target: "session", attempt = %attempt_id, "Player left before the submission settled");
      }
    });

    vec![ServerMessage::Finishing { trigger, local_score }]
  }

  fn edited(&self, changed: Option<bool>) -> Vec<ServerMessage> {
    match changed {
      Some(true) => vec![self.answers_msg()],
      _ => Vec::new(),
    }
  }

  fn answers_msg(&self) -> ServerMessage {
    ServerMessage::Answers {
      answers: self.active.answers_json(),
      answered: self.active.answered_count(),
      complete: self.active.is_answer_complete(),
    }
  }

  fn wrong_kind<T>(&self, action: &str) -> Option<T> {
    debug!(target: "session", kind = %self.active.kind(), action, "Input does not apply to this challenge type");
    None
  }
}

fn error_msg(e: SessionError) -> ServerMessage {
  ServerMessage::Error { message: e.to_string() }
}
