//! # scan-core
//!
//! Shared library for Scan Station containing the hardware barcode-scanner
//! detector, the serial scanner framer, the idle-timer port, and the domain
//! types they exchange with a host.
//!
//! It has zero dependencies on OS APIs, UI frameworks, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! A USB barcode scanner usually presents itself to the computer as a
//! *keyboard*.  When it reads a label it "types" the barcode very quickly and
//! finishes with an Enter key.  To the operating system this looks exactly
//! like a person typing, except that the characters arrive only a few
//! milliseconds apart.
//!
//! This crate tells the two apart by timing:
//!
//! - **`domain`** – Plain data: key events, detector configuration, and the
//!   scan events a host publishes.
//!
//! - **`detector`** – The [`HardwareScanInputDetector`].  A small state machine
//!   that buffers machine-speed bursts and hands each complete scan to a
//!   [`ScanSink`] exactly once.
//!
//! - **`serial`** – The [`SerialScanAssembler`] for scanners attached as a
//!   serial (virtual COM) port, where bytes arrive in chunks and a quiet period
//!   ends a scan.
//!
//! - **`timer`** – The [`IdleTimer`] port.  The core never sleeps; it asks the
//!   host to call it back after a delay and ignores callbacks it cancelled.
//!
//! - **`sequence`** – A thread-safe counter used to number published scans.

pub mod detector;
pub mod domain;
pub mod sequence;
pub mod serial;
pub mod timer;

// Re-export the most-used types at the crate root so callers can write
// `scan_core::KeyInput` instead of `scan_core::domain::key::KeyInput`.
pub use detector::{DetectorId, DetectorState, HardwareScanInputDetector, KeyDisposition, ScanSink};
pub use domain::config::{ConfigError, DetectorConfig, SerialFramingConfig};
pub use domain::key::{KeyInput, Modifiers, TERMINATOR_KEY};
pub use domain::scan::{ScanEvent, ScanSource};
pub use sequence::SequenceCounter;
pub use serial::SerialScanAssembler;
pub use timer::{IdleTimer, ManualIdleTimer, TimerToken};
