//! WebSocket upgrade + per-attempt event loop.
//!
//! One connection plays one challenge. The loop multiplexes player messages,
//! countdown events and submission results; closing the socket abandons the
//! attempt without submitting it.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    Path, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument, warn};

use crate::play::PlayerSession;
use crate::protocol::{to_out, ClientMessage, ServerMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state), fields(%challenge_id))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Path(challenge_id): Path<String>,
) -> impl IntoResponse {
  info!(target: "challenge_engine", %challenge_id, "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, challenge_id))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, challenge_id: String) {
  // Nothing is playable until the item set has resolved.
  let detail = match state.backend.fetch_challenge(&challenge_id).await {
    Ok(detail) => detail,
    Err(e) => {
      error!(target: "challenge_engine", %challenge_id, error = %e, "Cannot load challenge for play");
      let _ = send(&mut socket, &ServerMessage::Error { message: format!("Challenge unavailable: {}", e) }).await;
      return;
    }
  };

  let session_cfg = &state.config.session;
  let (mut player, mut results) = PlayerSession::new(&detail, session_cfg, state.backend.clone());
  let hello = ServerMessage::Challenge {
    challenge: to_out(&detail, session_cfg.puzzle_grid),
    time_budget_secs: session_cfg.time_budget_secs,
  };
  if send(&mut socket, &hello).await.is_err() {
    player.exit();
    return;
  }
  info!(target: "challenge_engine", %challenge_id, kind = %detail.kind(), "WebSocket play session opened");

  loop {
    let replies = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "challenge_engine", ?msg, "WS received");
            player.handle(msg)
          }
          Err(e) => vec![ServerMessage::Error { message: format!("Invalid JSON: {}", e) }],
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Err(e)) => {
          warn!(target: "challenge_engine", error = %e, "WS receive error");
          break;
        }
        Some(Ok(_)) => continue,
      },
      Some(event) = player.next_timer_event() => player.on_timer(event),
      Some(done) = results.recv() => player.on_submission(done),
    };

    let mut failed = false;
    for reply in &replies {
      if send(&mut socket, reply).await.is_err() {
        failed = true;
        break;
      }
    }
    if failed {
      break;
    }
  }

  player.exit();
  info!(target: "challenge_engine", %challenge_id, "WebSocket play session closed");
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "challenge_engine", error = %e, "WS send error");
    e
  })
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  use async_trait::async_trait;
  use futures_util::{SinkExt, StreamExt};
  use serde_json::{json, Value};
  use tokio::net::TcpListener;
  use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream};

  use super::*;
  use crate::backend::{BackendError, ChallengeBackend};
  use crate::config::EngineConfig;
  use crate::domain::ChallengeDetail;
  use crate::protocol::SubmissionPayload;
  use crate::routes::build_router;

  type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

  #[derive(Default)]
  struct Capitals {
    submits: AtomicUsize,
  }

  #[async_trait]
  impl ChallengeBackend for Capitals {
    async fn fetch_challenge(&self, challenge_id: &str) -> Result<ChallengeDetail, BackendError> {
      if challenge_id != "fb-1" {
        return Err(BackendError::Unavailable(format!("unknown challenge {challenge_id}")));
      }
      Ok(serde_json::from_value(json!({
        "id": "fb-1",
        "title": "Capitals",
        "type": "fill_blank",
        "sentences": [{ "id": 1, "sentence": "The capital of France is ___.", "correct_word": "Paris" }]
      }))
      .expect("fixture"))
    }

    async fn submit_attempt(&self, _challenge_id: &str, payload: &SubmissionPayload) -> Result<u32, BackendError> {
      self.submits.fetch_add(1, Ordering::SeqCst);
      match payload {
        SubmissionPayload::FillBlank { answers } => Ok(answers.len() as u32 * 7),
        _ => Err(BackendError::Unavailable("unexpected payload".into())),
      }
    }
  }

  async fn serve(backend: Arc<Capitals>) -> std::net::SocketAddr {
    let state = Arc::new(AppState::with_backend(EngineConfig::default(), backend));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move { axum::serve(listener, build_router(state)).await });
    addr
  }

  async fn connect(addr: std::net::SocketAddr, challenge_id: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws/{challenge_id}")).await.expect("connect");
    client
  }

  async fn say(client: &mut Client, msg: Value) {
    client.send(WsMessage::text(msg.to_string())).await.expect("send");
  }

  /// Next JSON message from the engine, skipping countdown ticks.
  async fn hear(client: &mut Client) -> Value {
    loop {
      let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("engine replied in time")
        .expect("socket open")
        .expect("frame");
      if let WsMessage::Text(text) = frame {
        let value: Value = serde_json::from_str(text.as_str()).expect("json");
        if value["type"] != "tick" {
          return value;
        }
      }
    }
  }

  #[tokio::test]
  async fn start_answer_finish_and_result_over_a_socket() {
    let backend = Arc::new(Capitals::default());
    let addr = serve(backend.clone()).await;
    let mut client = connect(addr, "fb-1").await;

    let hello = hear(&mut client).await;
    assert_eq!(hello["type"], "challenge");
    assert_eq!(hello["challenge"]["type"], "fill_blank");
    assert!(!hello.to_string().contains("Paris"));

    say(&mut client, json!({ "type": "start" })).await;
    let started = hear(&mut client).await;
    assert_eq!(started["type"], "started");
    assert_eq!(started["remaining_seconds"], 180);

    say(&mut client, json!({ "type": "set_text", "index": 0, "text": "  paris " })).await;
    let answers = hear(&mut client).await;
    assert_eq!(answers["type"], "answers");
    assert_eq!(answers["complete"], true);

    say(&mut client, json!({ "type": "finish" })).await;
    let finishing = hear(&mut client).await;
    assert_eq!(finishing["type"], "finishing");
    assert_eq!(finishing["trigger"], "manual");
    assert_eq!(finishing["local_score"], 1);

    let result = hear(&mut client).await;
    assert_eq!(result["type"], "result");
    assert_eq!(result["result"]["local_score"], 1);
    assert_eq!(result["result"]["server_score"], 7);
    assert_eq!(result["result"]["score"], 7);
    assert_eq!(result["result"]["submission"]["outcome"], "confirmed");

    say(&mut client, json!({ "type": "finish" })).await;
    say(&mut client, json!({ "type": "ping" })).await;
    assert_eq!(hear(&mut client).await["type"], "pong");
    assert_eq!(backend.submits.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn closing_mid_attempt_submits_nothing() {
    let backend = Arc::new(Capitals::default());
    let addr = serve(backend.clone()).await;
    let mut client = connect(addr, "fb-1").await;
    hear(&mut client).await;

    say(&mut client, json!({ "type": "start" })).await;
    assert_eq!(hear(&mut client).await["type"], "started");
    client.close(None).await.expect("close");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.submits.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn unknown_challenge_reports_an_error() {
    let addr = serve(Arc::new(Capitals::default())).await;
    let mut client = connect(addr, "nope").await;
    let msg = hear(&mut client).await;
    assert_eq!(msg["type"], "error");
    assert!(msg["message"].as_str().unwrap_or_default().contains("unknown challenge nope"));
  }
}
