//! Scan results as seen by consumers of a host.

use serde::{Deserialize, Serialize};

/// Where a scan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    /// A keyboard-wedge scanner recognised by the burst detector.
    Keyboard,
    /// A scanner attached as a serial port.
    Serial,
}

/// A published scan.
///
/// The core detector only hands out the barcode string; hosts wrap it in a
/// `ScanEvent` when fanning it out to several consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Position of this scan in the host's output stream.
    pub sequence: u64,
    pub source: ScanSource,
    pub barcode: String,
}
