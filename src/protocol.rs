//! Wire structs (serde ready):
//! - bodies exchanged with the REST backend on submission,
//! - WebSocket messages between the player UI and the engine,
//! - public challenge views with the answers stripped out.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ChallengeContent, ChallengeDetail, ChallengeKind, ItemId, OptionId};
use crate::gate::SubmissionOutcome;
use crate::session::{FinishTrigger, SessionState};

//
// Backend submission
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizAnswerOut {
    #[serde(rename = "questionId")]
    pub question_id: ItemId,
    #[serde(rename = "answerId")]
    pub answer_id: OptionId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderingAnswerOut {
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// 1-based slot in the player's final order.
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillBlankAnswerOut {
    #[serde(rename = "questionId")]
    pub question_id: ItemId,
    pub answer: String,
}

/// Type-specific part of the submit body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubmissionPayload {
    Quiz { answers: Vec<QuizAnswerOut> },
    Ordering { answers: Vec<OrderingAnswerOut> },
    FillBlank { answers: Vec<FillBlankAnswerOut> },
    Puzzle { score: u32 },
}

#[derive(Debug, Serialize)]
pub struct SubmitRequest<'a> {
    #[serde(rename = "challengeId")]
    pub challenge_id: &'a str,
    #[serde(flatten)]
    pub payload: &'a SubmissionPayload,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub score: f64,
}

impl SubmitResponse {
    pub fn score_u32(&self) -> u32 {
        if self.score.is_finite() && self.score > 0.0 {
            self.score.round().min(u32::MAX as f64) as u32
        } else {
            0
        }
    }
}

//
// Result & review contracts
//

/// One row of the "view answers" screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewEntry {
    pub index: usize,
    pub prompt: String,
    pub given: String,
    pub expected: String,
    pub correct: bool,
}

/// What the result dialog renders once the attempt is submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub attempt_id: Uuid,
    pub challenge_id: String,
    pub kind: ChallengeKind,
    pub trigger: FinishTrigger,
    pub local_score: u32,
    pub server_score: Option<u32>,
    /// Server score when present, otherwise the local one.
    pub score: u32,
    pub max_score: u32,
    pub answered: usize,
    pub total: usize,
    pub submission: SubmissionOutcome,
}

//
// WebSocket
//

/// Messages the player UI sends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Start,
    SelectOption { question: usize, option: OptionId },
    ToggleOption { question: usize, option: OptionId },
    MoveItem { from: usize, to: usize },
    SetText { index: usize, text: String },
    PasteText { start: usize, text: String },
    MoveTile { position: usize },
    Goto { index: usize },
    Next,
    Prev,
    Finish,
    ViewAnswers,
    Back,
    Restart,
}

/// Messages the engine pushes back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong,
    Challenge {
        challenge: ChallengeOut,
        time_budget_secs: u32,
    },
    Started {
        attempt_id: Uuid,
        remaining_seconds: u32,
        clock: String,
        answers: serde_json::Value,
    },
    Tick {
        remaining_seconds: u32,
        clock: String,
    },
    Answers {
        answers: serde_json::Value,
        answered: usize,
        complete: bool,
    },
    Cursor {
        index: usize,
    },
    Finishing {
        trigger: FinishTrigger,
        local_score: u32,
    },
    Result {
        result: ResultView,
    },
    Review {
        entries: Vec<ReviewEntry>,
    },
    State {
        state: SessionState,
    },
    Error {
        message: String,
    },
}

//
// HTTP
//

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}

//
// Public challenge view
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeOut {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub content: ChallengeContentOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChallengeContentOut {
    Quiz { questions: Vec<QuestionOut> },
    Ordering { items: Vec<OrderingItemOut> },
    FillBlank { sentences: Vec<SentenceOut> },
    Puzzle {
        instruction: String,
        image_url: String,
        grid_size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOut {
    pub id: ItemId,
    pub text: String,
    pub multiple: bool,
    pub options: Vec<OptionOut>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionOut {
    pub id: OptionId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderingItemOut {
    pub id: ItemId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceOut {
    pub id: ItemId,
    pub sentence: String,
}

/// Convert a full `ChallengeDetail` to the public view. Correct flags, correct
/// orders and correct words never leave the engine.
pub fn to_out(c: &ChallengeDetail, default_grid: usize) -> ChallengeOut {
    let content = match &c.content {
        ChallengeContent::Quiz { questions } => ChallengeContentOut::Quiz {
            questions: questions
                .iter()
                .map(|q| QuestionOut {
                    id: q.id,
                    text: q.text.clone(),
                    multiple: q.multiple,
                    options: q
                        .options
                        .iter()
                        .map(|o| OptionOut { id: o.id, text: o.text.clone() })
                        .collect(),
                })
                .collect(),
        },
        ChallengeContent::Ordering { items } => ChallengeContentOut::Ordering {
            items: items
                .iter()
                .map(|i| OrderingItemOut { id: i.id, content: i.content.clone() })
                .collect(),
        },
        ChallengeContent::FillBlank { sentences } => ChallengeContentOut::FillBlank {
            sentences: sentences
                .iter()
                .map(|s| SentenceOut { id: s.id, sentence: s.sentence.clone() })
                .collect(),
        },
        ChallengeContent::Puzzle(spec) => ChallengeContentOut::Puzzle {
            instruction: spec.instruction.clone(),
            image_url: spec.image_url.clone(),
            grid_size: crate::adapters::puzzle::resolve_grid(spec.grid_size, default_grid),
        },
    };

    ChallengeOut { id: c.id.clone(), title: c.title.clone(), content }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_body_flattens_payload_next_to_challenge_id() {
        let payload = SubmissionPayload::Quiz {
            answers: vec![QuizAnswerOut { question_id: 1, answer_id: 10 }],
        };
        let body = serde_json::to_value(SubmitRequest { challenge_id: "42", payload: &payload }).expect("json");
        assert_eq!(
            body,
            json!({ "challengeId": "42", "answers": [{ "questionId": 1, "answerId": 10 }] })
        );

        let puzzle = SubmissionPayload::Puzzle { score: 100 };
        let body = serde_json::to_value(SubmitRequest { challenge_id: "p", payload: &puzzle }).expect("json");
        assert_eq!(body, json!({ "challengeId": "p", "score": 100 }));
    }

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"select_option","question":0,"option":11}"#).expect("msg");
        assert_eq!(msg, ClientMessage::SelectOption { question: 0, option: 11 });
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"view_answers"}"#).expect("msg");
        assert_eq!(msg, ClientMessage::ViewAnswers);
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"explode"}"#).is_err());
    }

    #[test]
    fn public_view_hides_correct_answers() {
        let detail: ChallengeDetail = serde_json::from_value(json!({
            "id": "9", "title": "Dates", "type": "fill_blank",
            "sentences": [{ "id": 3, "sentence": "The capital of France is ___.", "correct_word": "Paris" }]
        }))
        .expect("detail");
        let out = serde_json::to_string(&to_out(&detail, 3)).expect("json");
        assert!(out.contains("\"type\":\"fill_blank\""));
        assert!(!out.contains("Paris"));
    }

    #[test]
    fn server_score_is_rounded_and_clamped() {
        assert_eq!(SubmitResponse { score: 2.6 }.score_u32(), 3);
        assert_eq!(SubmitResponse { score: -4.0 }.score_u32(), 0);
        assert_eq!(SubmitResponse { score: f64::NAN }.score_u32(), 0);
    }
}
