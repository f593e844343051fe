//! End-to-end tests: synthetic keys and serial chunks flow through the
//! station queue, real Tokio idle timers (on paused time), and the broadcaster.

use std::sync::Arc;
use std::time::Duration;

use scan_core::{KeyInput, ScanSource};
use scan_station::application::detect_scans::{run_station, station_channel, StationEvent};
use scan_station::application::publish_scans::ScanBroadcaster;
use scan_station::infrastructure::bootstrap::assemble_station;
use scan_station::infrastructure::input_capture::mock::MockInputSource;
use scan_station::infrastructure::input_capture::{forward_keys, KeyInputSource};
use scan_station::infrastructure::serial::pump_serial;
use scan_station::infrastructure::storage::config::StationConfig;

#[tokio::test(start_paused = true)]
async fn test_keyboard_scan_is_published_and_suppressed() {
    // Arrange
    let (handle, events) = station_channel();
    let broadcaster = ScanBroadcaster::default();
    let mut scans = broadcaster.subscribe();
    let station = assemble_station(&StationConfig::default(), &handle, &broadcaster).unwrap();
    let source = Arc::new(MockInputSource::new());
    let keys = source.start().unwrap();
    tokio::spawn(forward_keys(keys, handle.clone()));
    let run = tokio::spawn(run_station(
        station,
        events,
        Some(Arc::clone(&source) as Arc<dyn KeyInputSource>),
    ));

    // Act
    source.inject_scan("LOT-2024-0001", 1_000, 8);
    let scan = scans.recv().await.expect("scan published");
    source.stop();
    run.await.unwrap();

    // Assert
    assert_eq!(scan.barcode, "LOT-2024-0001");
    assert_eq!(scan.source, ScanSource::Keyboard);
    assert_eq!(scan.sequence, 0);
    assert_eq!(source.suppress_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_human_typing_then_scan_only_reports_scan() {
    // Arrange
    let (handle, events) = station_channel();
    let broadcaster = ScanBroadcaster::default();
    let station = assemble_station(&StationConfig::default(), &handle, &broadcaster).unwrap();
    let source = Arc::new(MockInputSource::new());
    let keys = source.start().unwrap();
    tokio::spawn(forward_keys(keys, handle.clone()));
    let run = tokio::spawn(run_station(
        station,
        events,
        Some(Arc::clone(&source) as Arc<dyn KeyInputSource>),
    ));

    // Act: "note" typed at 200ms per key, Enter after a pause, then a scan
    for (i, ch) in ["n", "o", "t", "e"].iter().enumerate() {
        source.inject_key(KeyInput::new(*ch, i as u64 * 200));
    }
    source.inject_key(KeyInput::new("Enter", 2_000));
    source.inject_scan("MAT-55", 5_000, 10);
    source.stop();
    let station = run.await.unwrap();

    // Assert
    let last = broadcaster.last_scanned().unwrap();
    assert_eq!(last.barcode, "MAT-55");
    assert_eq!(last.sequence, 0, "the typed word never became a scan");
    // Enter is consumed both times, even with nothing to report
    assert_eq!(source.suppress_count(), 2);
    assert!(!station.keyboard().is_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_burst_is_discarded_by_idle_timer() {
    // Arrange
    let (handle, events) = station_channel();
    let broadcaster = ScanBroadcaster::default();
    let station = assemble_station(&StationConfig::default(), &handle, &broadcaster).unwrap();
    let run = tokio::spawn(run_station(station, events, None));

    // Act: a fast burst with no Enter, then a long wait, then a lone Enter
    for (i, ch) in ["X", "Y", "Z", "1"].iter().enumerate() {
        handle.post(StationEvent::Key(KeyInput::new(*ch, i as u64 * 5))).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.post(StationEvent::Key(KeyInput::new("Enter", 20))).unwrap();
    handle.shutdown().unwrap();
    run.await.unwrap();

    // Assert
    assert!(broadcaster.last_scanned().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_serial_chunks_are_framed_after_quiet_period() {
    // Arrange
    let (handle, events) = station_channel();
    let broadcaster = ScanBroadcaster::default();
    let mut scans = broadcaster.subscribe();
    let mut config = StationConfig::default();
    config.serial.enabled = true;
    config.serial.port = Some("/dev/ttyUSB0".to_string());
    config.scanner.enabled = false;
    let station = assemble_station(&config, &handle, &broadcaster).unwrap();
    let run = tokio::spawn(run_station(station, events, None));

    // Act: one framed read, STX prefix and CR/LF suffix included
    let bytes: &[u8] = b"\x02PN-7781\r\n";
    pump_serial(bytes, &handle.sender()).unwrap();
    let scan = scans.recv().await.expect("serial scan published");
    handle.shutdown().unwrap();
    run.await.unwrap();

    // Assert
    assert_eq!(scan.barcode, "PN-7781");
    assert_eq!(scan.source, ScanSource::Serial);
}

#[tokio::test]
async fn test_disable_then_enable_through_handle() {
    // Arrange
    let (handle, events) = station_channel();
    let broadcaster = ScanBroadcaster::default();
    let station = assemble_station(&StationConfig::default(), &handle, &broadcaster).unwrap();
    let run = tokio::spawn(run_station(station, events, None));
    let post_scan = |text: &str, start: u64| {
        let mut t = start;
        for ch in text.chars() {
            handle.post(StationEvent::Key(KeyInput::new(ch.to_string(), t))).unwrap();
            t += 5;
        }
        handle.post(StationEvent::Key(KeyInput::new("Enter", t))).unwrap();
    };

    // Act
    handle.disable().unwrap();
    post_scan("IGNORED", 0);
    handle.enable().unwrap();
    post_scan("KEPT", 1_000);
    handle.shutdown().unwrap();
    run.await.unwrap();

    // Assert
    let last = broadcaster.last_scanned().unwrap();
    assert_eq!(last.barcode, "KEPT");
    assert_eq!(last.sequence, 0);
}
