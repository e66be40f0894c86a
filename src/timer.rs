//! Per-attempt countdown.
//!
//! A `Countdown` owns its tokio task. Dropping it (or calling `stop`) aborts
//! the task and closes the channel, so a stale countdown can never deliver an
//! event to a newer attempt.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining: u32 },
    Expired,
}

pub struct Countdown {
    rx: mpsc::Receiver<TimerEvent>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start ticking down from `budget_secs`. The first tick arrives one
    /// second after the call; `Expired` follows the tick that reaches zero.
    pub fn start(budget_secs: u32) -> Self {
        let (tx, rx) = mpsc::channel(8);

        let handle = tokio::spawn(async move {
            if budget_secs == 0 {
                let _ = tx.send(TimerEvent::Expired).await;
                return;
            }

            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut remaining = budget_secs;

            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                if tx.send(TimerEvent::Tick { remaining }).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(TimerEvent::Expired).await;
        });

        Self { rx, handle }
    }

    /// Next event, or `None` once the countdown has expired and drained.
    pub async fn recv(&mut self) -> Option<TimerEvent> {
        self.rx.recv().await
    }

    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// `m:ss` clock used by the player UI.
pub fn format_clock(total_secs: u32) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
