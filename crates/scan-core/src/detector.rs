//! HardwareScanInputDetector: separates scanner bursts from human typing.
//!
//! A keyboard-wedge scanner "types" a barcode at machine speed and ends it
//! with Enter.  The detector watches every key-down on the page/terminal and
//! decides, from timing alone, which keys belong to a scan.  Recognised scans
//! are handed to a [`ScanSink`] exactly once; everything else passes through
//! untouched so normal typing and shortcuts keep working.
//!
//! # State machine
//!
//! ```text
//!            qualifying key                 qualifying key (gap <= threshold)
//!   Idle ───────────────────▶ Accumulating ◀──────────────────┐
//!    ▲                            │  │  └─────────────────────┘
//!    │      Enter (may emit)      │  │ qualifying key (gap > threshold):
//!    ├────────────────────────────┘  │ buffer cleared, burst restarts
//!    │      idle flush (never emits) │
//!    └───────────────────────────────┘
//! ```
//!
//! There is no error state: every unexpected input resolves to Idle or is
//! ignored.
//!
//! # Time
//!
//! The detector has no clock.  Key timing comes from [`KeyInput::timestamp_ms`]
//! and the idle flush from the injected [`IdleTimer`].  If the host delivers a
//! key whose timestamp lies beyond the idle window before it delivered the
//! timer expiry, the flush is applied first, so the outcome never depends on
//! how promptly the host runs its timers.

use std::fmt;

use tracing::{debug, trace};
use uuid::Uuid;

use crate::domain::config::DetectorConfig;
use crate::domain::key::KeyInput;
use crate::timer::{IdleTimer, TimerSlot, TimerToken};

/// Receives completed scans.
///
/// Any `FnMut(String) + Send` closure is a sink.
pub trait ScanSink: Send {
    /// Called once per recognised scan.  Ownership of the barcode passes to
    /// the sink; the detector keeps no copy.
    fn on_scan(&mut self, barcode: String);
}

impl<F> ScanSink for F
where
    F: FnMut(String) + Send,
{
    fn on_scan(&mut self, barcode: String) {
        self(barcode)
    }
}

/// Identifies a detector instance in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetectorId(Uuid);

impl DetectorId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the detector did with a key-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The key was the terminator.  The host should suppress its default
    /// action (submitting a form, inserting a newline).
    Consumed,
    /// The key was appended to the current burst.  The host should let it
    /// through: the detector cannot yet know whether a person typed it.
    Buffered,
    /// The detector did not look at the key.
    Ignored,
}

/// Conceptual detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Accumulating,
}

/// The keyboard-burst scan detector.
///
/// One instance owns its buffer, last-key time and timer; instances never
/// share state.
pub struct HardwareScanInputDetector {
    id: DetectorId,
    config: DetectorConfig,
    enabled: bool,
    disposed: bool,
    buffer: String,
    /// `None` is the "unset" sentinel: no key since the last reset.
    last_key_ms: Option<u64>,
    idle_timer: TimerSlot,
    sink: Box<dyn ScanSink>,
}

impl HardwareScanInputDetector {
    /// Creates an enabled detector.
    pub fn new(
        config: DetectorConfig,
        timer: impl IdleTimer + 'static,
        sink: impl ScanSink + 'static,
    ) -> Self {
        let id = DetectorId::new();
        debug!(
            detector = %id,
            threshold_ms = config.inter_key_threshold_ms,
            min_length = config.minimum_scan_length,
            "scan detector created"
        );
        Self {
            id,
            config,
            enabled: true,
            disposed: false,
            buffer: String::new(),
            last_key_ms: None,
            idle_timer: TimerSlot::new(timer),
            sink: Box::new(sink),
        }
    }

    pub fn id(&self) -> DetectorId {
        self.id
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns whether key events are currently examined.
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.disposed
    }

    /// Returns the characters buffered for the current burst.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> DetectorState {
        if self.buffer.is_empty() {
            DetectorState::Idle
        } else {
            DetectorState::Accumulating
        }
    }

    /// Enables or disables detection.
    ///
    /// Both directions leave the detector clean: disabling cancels the idle
    /// timer and drops any partial burst, and enabling starts from an empty
    /// buffer.  Has no effect after [`dispose`](Self::dispose).
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.disposed || self.enabled == enabled {
            return;
        }
        self.reset();
        self.enabled = enabled;
        debug!(detector = %self.id, enabled, "scan detector toggled");
    }

    /// Equivalent to `set_enabled(true)`.
    pub fn start(&mut self) {
        self.set_enabled(true);
    }

    /// Equivalent to `set_enabled(false)`.
    pub fn stop(&mut self) {
        self.set_enabled(false);
    }

    /// Permanently stops the detector and releases its timer.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.reset();
        self.enabled = false;
        self.disposed = true;
        debug!(detector = %self.id, "scan detector disposed");
    }

    /// Processes one key-down.
    pub fn handle_key(&mut self, event: &KeyInput) -> KeyDisposition {
        if !self.is_enabled() {
            return KeyDisposition::Ignored;
        }

        let now = event.timestamp_ms;
        let gap = self.last_key_ms.map(|last| now.saturating_sub(last));

        // The idle window passed but its expiry has not been delivered yet.
        if self.idle_timer.is_pending() && gap.is_some_and(|g| g >= self.config.idle_flush_ms()) {
            trace!(detector = %self.id, "idle window elapsed before key; flushing first");
            self.discard_burst();
        }

        if event.is_terminator() {
            self.finish_scan();
            return KeyDisposition::Consumed;
        }

        let Some(ch) = event.scan_char() else {
            return KeyDisposition::Ignored;
        };

        if let (Some(_), Some(gap)) = (self.last_key_ms, gap) {
            if gap > self.config.inter_key_threshold_ms {
                trace!(detector = %self.id, gap_ms = gap, "gap exceeded; starting new burst");
                self.buffer.clear();
            }
        }

        self.buffer.push(ch);
        self.last_key_ms = Some(now);
        self.idle_timer.arm(self.config.idle_flush_delay());
        KeyDisposition::Buffered
    }

    /// Delivers an idle-timer expiry.
    ///
    /// Returns `true` if `token` was the pending timer and the burst was
    /// discarded; stale tokens are ignored.
    pub fn on_idle_timer(&mut self, token: TimerToken) -> bool {
        if !self.idle_timer.expire(token) {
            trace!(detector = %self.id, token = token.value(), "stale idle timer ignored");
            return false;
        }
        if !self.buffer.is_empty() {
            debug!(
                detector = %self.id,
                discarded = self.buffer.chars().count(),
                "unterminated burst discarded"
            );
        }
        self.buffer.clear();
        self.last_key_ms = None;
        true
    }

    fn finish_scan(&mut self) {
        self.idle_timer.cancel();
        let scanned = self.buffer.trim();
        let length = scanned.chars().count();
        if length >= self.config.minimum_scan_length {
            let barcode = scanned.to_string();
            debug!(detector = %self.id, length, "scan recognised");
            self.sink.on_scan(barcode);
        } else if length > 0 {
            debug!(
                detector = %self.id,
                length,
                min_length = self.config.minimum_scan_length,
                "scan shorter than minimum dropped"
            );
        }
        self.buffer.clear();
        self.last_key_ms = None;
    }

    fn discard_burst(&mut self) {
        self.idle_timer.cancel();
        self.buffer.clear();
        self.last_key_ms = None;
    }

    fn reset(&mut self) {
        self.discard_burst();
    }
}

impl fmt::Debug for HardwareScanInputDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareScanInputDetector")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("enabled", &self.enabled)
            .field("disposed", &self.disposed)
            .field("buffer", &self.buffer)
            .field("last_key_ms", &self.last_key_ms)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
