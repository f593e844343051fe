//! Mock key source for unit testing.
//!
//! Allows tests to inject synthetic [`KeyInput`]s without a terminal.

use std::sync::{Arc, Mutex};

use scan_core::KeyInput;
use tokio::sync::mpsc::{self, UnboundedSender};

use super::{CaptureError, KeyInputSource};

/// A mock implementation of [`KeyInputSource`] that allows tests to inject keys.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<UnboundedSender<KeyInput>>>>,
    suppress_count: Arc<Mutex<u32>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            suppress_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Injects a synthetic key-down, as if typed or scanned.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_key(&self, key: KeyInput) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(key)
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockInputSource::inject_key called before start()");
        }
    }

    /// Injects each character of `text` followed by Enter, `step_ms` apart,
    /// starting at `start_ms`.  Returns the timestamp of the Enter key.
    pub fn inject_scan(&self, text: &str, start_ms: u64, step_ms: u64) -> u64 {
        let mut t = start_ms;
        for ch in text.chars() {
            self.inject_key(KeyInput::new(ch.to_string(), t));
            t += step_ms;
        }
        self.inject_key(KeyInput::new(scan_core::TERMINATOR_KEY, t));
        t
    }

    /// Returns the number of times [`suppress_current_event`] was called.
    ///
    /// [`suppress_current_event`]: KeyInputSource::suppress_current_event
    pub fn suppress_count(&self) -> u32 {
        *self.suppress_count.lock().expect("lock poisoned")
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<KeyInput>, CaptureError> {
        let mut guard = self.sender.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }

    fn suppress_current_event(&self) {
        let mut count = self.suppress_count.lock().expect("lock poisoned");
        *count += 1;
    }
}
