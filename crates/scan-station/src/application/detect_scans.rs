//! ScanStation: the single-threaded event loop around the scan detectors.
//!
//! Every input the station reacts to (key-downs, serial chunks, idle-timer
//! expiries, enable/disable requests, shutdown) arrives as a [`StationEvent`]
//! on one queue and is handled to completion before the next one is read.
//! That gives the detector a total order of events without any locking, the
//! same guarantee a browser's event loop gives a page script.
//!
//! # Architecture
//!
//! ```text
//!  terminal thread ──Key──┐
//!  serial thread ──Bytes──┼──▶ mpsc ──▶ run_station ──▶ ScanStation::dispatch
//!  idle timer tasks ─Fired┤                               ├─ HardwareScanInputDetector
//!  StationHandle ─control─┘                               └─ SerialScanAssembler
//! ```

use std::sync::Arc;

use scan_core::{HardwareScanInputDetector, KeyDisposition, KeyInput, SerialScanAssembler, TimerToken};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::infrastructure::input_capture::KeyInputSource;

/// Error type for station control operations.
#[derive(Debug, Error)]
pub enum StationError {
    #[error("station event loop has stopped")]
    Closed,
}

/// Which owner an idle timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTarget {
    Keyboard,
    Serial,
}

/// Everything the station event loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEvent {
    /// A key-down from the keyboard source.
    Key(KeyInput),
    /// A chunk read from the serial scanner.
    SerialBytes(Vec<u8>),
    /// The serial port closed or failed.
    SerialDisconnected,
    /// An idle timer elapsed.
    IdleTimerFired { target: TimerTarget, token: TimerToken },
    /// Enable or disable keyboard scan detection.
    SetEnabled(bool),
    /// Stop the event loop.
    Shutdown,
}

/// What the run loop should do after dispatching an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    /// The detector consumed the key; ask the source to suppress it.
    Suppress,
    Stop,
}

/// Creates the station queue and a handle for posting into it.
pub fn station_channel() -> (StationHandle, mpsc::UnboundedReceiver<StationEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StationHandle { tx }, rx)
}

/// Cloneable handle used by sources, timers and the host to post events.
#[derive(Debug, Clone)]
pub struct StationHandle {
    tx: mpsc::UnboundedSender<StationEvent>,
}

impl StationHandle {
    /// Returns a raw sender for adapters that post events themselves.
    pub fn sender(&self) -> mpsc::UnboundedSender<StationEvent> {
        self.tx.clone()
    }

    /// Posts an arbitrary event.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::Closed`] once the event loop has exited.
    pub fn post(&self, event: StationEvent) -> Result<(), StationError> {
        self.tx.send(event).map_err(|_| StationError::Closed)
    }

    /// Re-enables keyboard scan detection.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub fn enable(&self) -> Result<(), StationError> {
        self.post(StationEvent::SetEnabled(true))
    }

    /// Disables keyboard scan detection, dropping any partial scan.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub fn disable(&self) -> Result<(), StationError> {
        self.post(StationEvent::SetEnabled(false))
    }

    /// Asks the event loop to stop after the events already queued.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub fn shutdown(&self) -> Result<(), StationError> {
        self.post(StationEvent::Shutdown)
    }
}

/// The scan station: one keyboard detector and an optional serial framer.
#[derive(Debug)]
pub struct ScanStation {
    keyboard: HardwareScanInputDetector,
    serial: Option<SerialScanAssembler>,
}

impl ScanStation {
    pub fn new(keyboard: HardwareScanInputDetector) -> Self {
        Self {
            keyboard,
            serial: None,
        }
    }

    /// Attaches a serial framer.
    pub fn with_serial(mut self, assembler: SerialScanAssembler) -> Self {
        self.serial = Some(assembler);
        self
    }

    pub fn keyboard(&self) -> &HardwareScanInputDetector {
        &self.keyboard
    }

    pub fn serial(&self) -> Option<&SerialScanAssembler> {
        self.serial.as_ref()
    }

    /// Handles one event to completion.
    pub fn dispatch(&mut self, event: StationEvent) -> Dispatch {
        match event {
            StationEvent::Key(key) => match self.keyboard.handle_key(&key) {
                KeyDisposition::Consumed => Dispatch::Suppress,
                KeyDisposition::Buffered | KeyDisposition::Ignored => Dispatch::Continue,
            },
            StationEvent::SerialBytes(chunk) => {
                match self.serial.as_mut() {
                    Some(assembler) => {
                        assembler.push_bytes(&chunk);
                    }
                    None => trace!(len = chunk.len(), "serial bytes without serial framer dropped"),
                }
                Dispatch::Continue
            }
            StationEvent::SerialDisconnected => {
                if let Some(mut assembler) = self.serial.take() {
                    warn!("serial scanner disconnected; partial scan discarded");
                    assembler.reset();
                }
                Dispatch::Continue
            }
            StationEvent::IdleTimerFired { target, token } => {
                match target {
                    TimerTarget::Keyboard => {
                        self.keyboard.on_idle_timer(token);
                    }
                    TimerTarget::Serial => {
                        if let Some(assembler) = self.serial.as_mut() {
                            assembler.on_idle_timer(token);
                        }
                    }
                }
                Dispatch::Continue
            }
            StationEvent::SetEnabled(enabled) => {
                self.keyboard.set_enabled(enabled);
                Dispatch::Continue
            }
            StationEvent::Shutdown => Dispatch::Stop,
        }
    }

    /// Disposes the keyboard detector and drops any partial serial scan.
    pub fn shutdown(&mut self) {
        self.keyboard.dispose();
        if let Some(assembler) = self.serial.as_mut() {
            assembler.reset();
        }
    }
}

/// Runs the station until a [`StationEvent::Shutdown`] arrives or every
/// sender is gone.  Returns the (disposed) station.
///
/// Keys the detector consumed are reported back to `source` so it can
/// suppress their default action.
pub async fn run_station(
    mut station: ScanStation,
    mut events: mpsc::UnboundedReceiver<StationEvent>,
    source: Option<Arc<dyn KeyInputSource>>,
) -> ScanStation {
    info!(detector = %station.keyboard().id(), "scan station running");
    while let Some(event) = events.recv().await {
        match station.dispatch(event) {
            Dispatch::Continue => {}
            Dispatch::Suppress => {
                if let Some(source) = &source {
                    source.suppress_current_event();
                }
            }
            Dispatch::Stop => {
                debug!("shutdown requested");
                break;
            }
        }
    }
    station.shutdown();
    info!("scan station stopped");
    station
}

// ── Tests ─────────────────────────────────────────────────────────────────────
