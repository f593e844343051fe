//! Keyboard input capture for the scan station.
//!
//! A keyboard-wedge scanner is just another keyboard, so the station reads the
//! terminal's key-downs and forwards each one into the station queue as a
//! [`StationEvent::Key`].  The terminal source runs its blocking poll loop on a
//! dedicated thread; keys cross into the Tokio runtime over an unbounded
//! channel.
//!
//! # Testability
//!
//! The [`KeyInputSource`] trait allows tests to inject synthetic keys without a
//! real terminal; see [`mock::MockInputSource`].

use scan_core::KeyInput;
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::detect_scans::{StationEvent, StationHandle};

pub mod mock;
pub mod terminal;

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to configure terminal: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("input source is already running")]
    AlreadyStarted,
}

/// Trait abstracting key-down production.
///
/// The production implementation reads the terminal; tests use
/// [`mock::MockInputSource`].
pub trait KeyInputSource: Send + Sync {
    /// Starts the source and returns a receiver for captured key-downs.  The
    /// receiver closes when the source stops.
    fn start(&self) -> Result<mpsc::UnboundedReceiver<KeyInput>, CaptureError>;
    /// Stops the source and releases all OS resources.
    fn stop(&self);
    /// Instructs the source to suppress the key it delivered last.
    fn suppress_current_event(&self);
}

/// Forwards every key from `keys` into the station queue.
///
/// When the source closes its channel the station is asked to shut down,
/// since without a keyboard there is nothing left for it to do.
pub async fn forward_keys(mut keys: mpsc::UnboundedReceiver<KeyInput>, station: StationHandle) {
    while let Some(key) = keys.recv().await {
        if station.post(StationEvent::Key(key)).is_err() {
            debug!("station stopped; key forwarding ends");
            return;
        }
    }
    debug!("key source closed");
    // The station may already be gone; nothing to report then.
    let _ = station.shutdown();
}

// ── Tests ─────────────────────────────────────────────────────────────────────
