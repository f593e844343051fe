//! SerialScanAssembler: frames scans arriving from a serial scanner.
//!
//! Scanners configured as a (virtual) COM port deliver a barcode as one or more
//! byte chunks, often followed by CR/LF, with no per-key timing.  A scan is
//! complete when the port has been quiet for
//! [`SerialFramingConfig::idle_flush_ms`].
//!
//! Only printable ASCII (0x20..=0x7E) is kept; line terminators and other
//! control bytes are dropped before buffering.  A chunk that contains nothing
//! printable does not extend the quiet period.

use std::fmt;

use tracing::{debug, trace};

use crate::detector::ScanSink;
use crate::domain::config::SerialFramingConfig;
use crate::timer::{IdleTimer, TimerSlot, TimerToken};

/// Assembles serial byte chunks into scans.
pub struct SerialScanAssembler {
    config: SerialFramingConfig,
    buffer: String,
    idle_timer: TimerSlot,
    sink: Box<dyn ScanSink>,
}

impl SerialScanAssembler {
    pub fn new(
        config: SerialFramingConfig,
        timer: impl IdleTimer + 'static,
        sink: impl ScanSink + 'static,
    ) -> Self {
        Self {
            config,
            buffer: String::new(),
            idle_timer: TimerSlot::new(timer),
            sink: Box::new(sink),
        }
    }

    pub fn config(&self) -> &SerialFramingConfig {
        &self.config
    }

    /// Returns the text buffered since the last flush.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Appends the printable bytes of `chunk` and restarts the quiet period.
    ///
    /// Returns the number of bytes kept.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> usize {
        let before = self.buffer.len();
        self.buffer.extend(
            chunk
                .iter()
                .filter(|b| (0x20..=0x7e).contains(*b))
                .map(|&b| char::from(b)),
        );
        let kept = self.buffer.len() - before;
        if kept == 0 {
            trace!(len = chunk.len(), "serial chunk without printable bytes ignored");
            return 0;
        }
        self.idle_timer.arm(self.config.idle_flush_delay());
        kept
    }

    /// Delivers an idle-timer expiry.  Emits the trimmed buffer if it is not
    /// empty.  Returns `false` for stale tokens.
    pub fn on_idle_timer(&mut self, token: TimerToken) -> bool {
        if !self.idle_timer.expire(token) {
            trace!(token = token.value(), "stale serial idle timer ignored");
            return false;
        }
        let scanned = self.buffer.trim();
        if !scanned.is_empty() {
            let barcode = scanned.to_string();
            debug!(length = barcode.len(), "serial scan framed");
            self.sink.on_scan(barcode);
        }
        self.buffer.clear();
        true
    }

    /// Drops any partial scan and cancels the quiet-period timer.
    pub fn reset(&mut self) {
        self.idle_timer.cancel();
        self.buffer.clear();
    }
}

impl fmt::Debug for SerialScanAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialScanAssembler")
            .field("config", &self.config)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualIdleTimer;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn make_assembler() -> (SerialScanAssembler, ManualIdleTimer, Arc<Mutex<Vec<String>>>) {
        let timer = ManualIdleTimer::new();
        let scans = Arc::new(Mutex::new(Vec::new()));
        let sink_scans = Arc::clone(&scans);
        let assembler = SerialScanAssembler::new(
            SerialFramingConfig::default(),
            timer.clone(),
            move |barcode: String| sink_scans.lock().unwrap().push(barcode),
        );
        (assembler, timer, scans)
    }

    #[test]
    fn test_chunks_are_joined_until_quiet_period() {
        // Arrange
        let (mut asm, timer, scans) = make_assembler();

        // Act
        asm.push_bytes(b"MAT-");
        asm.push_bytes(b"0042\r\n");
        let token = timer.fire().expect("timer must be pending");
        asm.on_idle_timer(token);

        // Assert
        assert_eq!(*scans.lock().unwrap(), vec!["MAT-0042".to_string()]);
        assert_eq!(asm.pending(), "");
    }

    #[test]
    fn test_non_printable_bytes_are_stripped() {
        let (mut asm, _timer, _scans) = make_assembler();

        let kept = asm.push_bytes(&[0x02, b'A', 0x00, b'B', 0x7f, 0xff, b'C', 0x03]);

        assert_eq!(kept, 3);
        assert_eq!(asm.pending(), "ABC");
    }

    #[test]
    fn test_chunk_without_printables_does_not_rearm_timer() {
        let (mut asm, timer, _scans) = make_assembler();

        asm.push_bytes(b"A");
        asm.push_bytes(b"\r\n");

        assert_eq!(timer.schedule_count(), 1);
    }

    #[test]
    fn test_quiet_period_uses_configured_delay() {
        let (mut asm, timer, _scans) = make_assembler();

        asm.push_bytes(b"A");

        let (_, delay) = timer.pending().unwrap();
        assert_eq!(delay, Duration::from_millis(150));
    }

    #[test]
    fn test_whitespace_only_frame_is_not_emitted() {
        let (mut asm, timer, scans) = make_assembler();

        asm.push_bytes(b"   ");
        let token = timer.fire().unwrap();

        assert!(asm.on_idle_timer(token));
        assert!(scans.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let (mut asm, timer, scans) = make_assembler();
        asm.push_bytes(b"AB");
        let (stale, _) = timer.pending().unwrap();
        asm.push_bytes(b"CD");

        assert!(!asm.on_idle_timer(stale));
        assert!(scans.lock().unwrap().is_empty());
        assert_eq!(asm.pending(), "ABCD");
    }

    #[test]
    fn test_reset_discards_partial_scan() {
        let (mut asm, timer, _scans) = make_assembler();
        asm.push_bytes(b"PART");

        asm.reset();

        assert_eq!(asm.pending(), "");
        assert_eq!(timer.cancel_count(), 1);
        assert!(timer.pending().is_none());
    }
}
