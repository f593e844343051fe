//! Builds a [`ScanStation`] from a loaded [`StationConfig`].
//!
//! Both the keyboard detector and the serial framer get a [`TokioIdleTimer`]
//! that posts into the station queue, and a sink that publishes through the
//! shared [`ScanBroadcaster`].

use scan_core::{HardwareScanInputDetector, ScanSource, SerialScanAssembler};
use tracing::info;

use crate::application::detect_scans::{ScanStation, StationHandle, TimerTarget};
use crate::application::publish_scans::ScanBroadcaster;
use crate::infrastructure::storage::config::{StationConfig, StorageError};
use crate::infrastructure::timer::TokioIdleTimer;

/// Assembles the station described by `config`.
///
/// The keyboard detector starts disabled when `[scanner] enabled = false`.
/// A serial framer is attached only when the serial scanner is enabled and a
/// port is configured.  Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`StorageError::Invalid`] if a threshold or length is zero.
pub fn assemble_station(
    config: &StationConfig,
    station: &StationHandle,
    broadcaster: &ScanBroadcaster,
) -> Result<ScanStation, StorageError> {
    let detector_config = config.detector_config()?;
    let mut keyboard = HardwareScanInputDetector::new(
        detector_config,
        TokioIdleTimer::new(TimerTarget::Keyboard, station.sender()),
        broadcaster.sink(ScanSource::Keyboard),
    );
    if !config.scanner.enabled {
        keyboard.stop();
    }
    info!(
        threshold_ms = detector_config.inter_key_threshold_ms,
        min_length = detector_config.minimum_scan_length,
        keyboard = config.scanner.enabled,
        "keyboard scan detector configured"
    );

    let mut assembled = ScanStation::new(keyboard);
    if let Some(port) = config.serial_port() {
        let framing = config.framing_config()?;
        info!(port, idle_flush_ms = framing.idle_flush_ms, "serial scan framer configured");
        assembled = assembled.with_serial(SerialScanAssembler::new(
            framing,
            TokioIdleTimer::new(TimerTarget::Serial, station.sender()),
            broadcaster.sink(ScanSource::Serial),
        ));
    }
    Ok(assembled)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::detect_scans::station_channel;

    #[tokio::test]
    async fn test_default_config_builds_keyboard_only_station() {
        // Arrange
        let (handle, _rx) = station_channel();
        let broadcaster = ScanBroadcaster::default();

        // Act
        let station = assemble_station(&StationConfig::default(), &handle, &broadcaster).unwrap();

        // Assert
        assert!(station.keyboard().is_enabled());
        assert!(station.serial().is_none());
    }

    #[tokio::test]
    async fn test_serial_port_adds_framer_with_configured_quiet_period() {
        let (handle, _rx) = station_channel();
        let mut config = StationConfig::default();
        config.serial.enabled = true;
        config.serial.port = Some("/dev/ttyUSB0".to_string());
        config.serial.idle_flush_ms = 90;

        let station = assemble_station(&config, &handle, &ScanBroadcaster::default()).unwrap();

        assert_eq!(station.serial().unwrap().config().idle_flush_ms, 90);
    }

    #[tokio::test]
    async fn test_disabled_scanner_starts_detector_stopped() {
        let (handle, _rx) = station_channel();
        let mut config = StationConfig::default();
        config.scanner.enabled = false;

        let station = assemble_station(&config, &handle, &ScanBroadcaster::default()).unwrap();

        assert!(!station.keyboard().is_enabled());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let (handle, _rx) = station_channel();
        let mut config = StationConfig::default();
        config.scanner.minimum_scan_length = 0;

        let result = assemble_station(&config, &handle, &ScanBroadcaster::default());

        assert!(matches!(
            result,
            Err(StorageError::Invalid(scan_core::ConfigError::ZeroMinimumLength))
        ));
    }
}
