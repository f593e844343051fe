//! Terminal keyboard source built on `crossterm`.
//!
//! A USB scanner in keyboard-wedge mode types into whatever has focus; for a
//! headless station that is the terminal.  The source switches the terminal to
//! raw mode so keys arrive one at a time without echo or line buffering, then
//! polls for key events on a dedicated thread.
//!
//! # Key names
//!
//! Keys are translated to the same names a browser reports in
//! `KeyboardEvent.key`: printable keys become their character, and named keys
//! become `"Enter"`, `"Tab"`, `"ArrowLeft"` and so on.  Key releases are
//! dropped; auto-repeat counts as a key-down.
//!
//! Ctrl+C does not raise SIGINT in raw mode, so the poll thread treats it as a
//! request to stop and closes the key channel.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use scan_core::{KeyInput, Modifiers};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, trace, warn};

use super::{CaptureError, KeyInputSource};

/// How long one `crossterm::event::poll` waits before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct RunningCapture {
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Reads key-downs from the controlling terminal.
pub struct TerminalKeySource {
    capture: Mutex<Option<RunningCapture>>,
}

impl TerminalKeySource {
    pub fn new() -> Self {
        Self {
            capture: Mutex::new(None),
        }
    }
}

impl Default for TerminalKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInputSource for TerminalKeySource {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<KeyInput>, CaptureError> {
        let mut capture = self.capture.lock().expect("lock poisoned");
        if capture.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }

        terminal::enable_raw_mode()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let thread = thread::Builder::new()
            .name("terminal-keys".to_string())
            .spawn(move || poll_keys(&flag, &tx));
        let thread = match thread {
            Ok(thread) => thread,
            Err(e) => {
                let _ = terminal::disable_raw_mode();
                return Err(CaptureError::Terminal(e));
            }
        };

        info!("terminal key capture started");
        *capture = Some(RunningCapture { running, thread });
        Ok(rx)
    }

    fn stop(&self) {
        let Some(capture) = self.capture.lock().expect("lock poisoned").take() else {
            return;
        };
        capture.running.store(false, Ordering::Relaxed);
        if capture.thread.join().is_err() {
            warn!("terminal key thread panicked");
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("failed to restore terminal mode: {e}");
        }
        info!("terminal key capture stopped");
    }

    fn suppress_current_event(&self) {
        // Raw mode already keeps keys away from the shell; nothing else sees them.
        trace!("terminal key consumed by scan detector");
    }
}

impl Drop for TerminalKeySource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_keys(running: &AtomicBool, keys: &UnboundedSender<KeyInput>) {
    let epoch = Instant::now();
    while running.load(Ordering::Relaxed) {
        match event::poll(POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!("terminal poll failed: {e}");
                break;
            }
        }
        let key = match event::read() {
            Ok(Event::Key(key)) => key,
            Ok(_) => continue,
            Err(e) => {
                warn!("terminal read failed: {e}");
                break;
            }
        };
        if is_interrupt(&key) {
            debug!("Ctrl+C pressed; closing key source");
            break;
        }
        let timestamp_ms = u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        if let Some(input) = key_input_from_event(key, timestamp_ms) {
            if keys.send(input).is_err() {
                break;
            }
        }
    }
}

/// Returns `true` for Ctrl+C.
pub fn is_interrupt(event: &KeyEvent) -> bool {
    event.kind != KeyEventKind::Release
        && event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(event.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

/// Converts a crossterm key event to a [`KeyInput`].
///
/// Returns `None` for key releases and keys with no browser-style name.
pub fn key_input_from_event(event: KeyEvent, timestamp_ms: u64) -> Option<KeyInput> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let key = match event.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Insert => "Insert".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => return None,
    };

    Some(KeyInput::with_modifiers(key, timestamp_ms, convert_modifiers(event.modifiers)))
}

fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        meta: mods.intersects(KeyModifiers::META | KeyModifiers::SUPER),
        shift: mods.contains(KeyModifiers::SHIFT),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
