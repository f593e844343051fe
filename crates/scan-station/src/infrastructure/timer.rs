//! Tokio-backed [`IdleTimer`].
//!
//! Each schedule spawns a task that sleeps for the requested delay and then
//! posts [`StationEvent::IdleTimerFired`] into the station queue.  The expiry
//! is therefore handled on the station loop like any other event, never
//! concurrently with a key.  Cancelling or rescheduling aborts the sleeping
//! task; an expiry that was already queued is rejected by its stale token.
//!
//! Must be used from within a Tokio runtime.

use std::time::Duration;

use scan_core::{IdleTimer, TimerToken};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::application::detect_scans::{StationEvent, TimerTarget};

/// An idle timer that delivers expiries through the station queue.
#[derive(Debug)]
pub struct TokioIdleTimer {
    target: TimerTarget,
    events: UnboundedSender<StationEvent>,
    task: Option<JoinHandle<()>>,
}

impl TokioIdleTimer {
    pub fn new(target: TimerTarget, events: UnboundedSender<StationEvent>) -> Self {
        Self {
            target,
            events,
            task: None,
        }
    }
}

impl IdleTimer for TokioIdleTimer {
    fn schedule(&mut self, token: TimerToken, after: Duration) {
        self.cancel();
        let events = self.events.clone();
        let target = self.target;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(StationEvent::IdleTimerFired { target, token });
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioIdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
