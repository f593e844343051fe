//! End-to-end scenarios for the keyboard detector, driven through the public
//! API only: synthetic key streams in, recorded scans out.

use std::sync::{Arc, Mutex};

use scan_core::{
    DetectorConfig, HardwareScanInputDetector, KeyDisposition, KeyInput, ManualIdleTimer,
    Modifiers,
};

// ── Harness ───────────────────────────────────────────────────────────────────

struct Harness {
    detector: HardwareScanInputDetector,
    timer: ManualIdleTimer,
    scans: Arc<Mutex<Vec<String>>>,
    clock_ms: u64,
}

impl Harness {
    fn new(config: DetectorConfig) -> Self {
        let timer = ManualIdleTimer::new();
        let scans = Arc::new(Mutex::new(Vec::new()));
        let sink_scans = Arc::clone(&scans);
        let detector = HardwareScanInputDetector::new(config, timer.clone(), move |b: String| {
            sink_scans.lock().unwrap().push(b)
        });
        Self {
            detector,
            timer,
            scans,
            clock_ms: 0,
        }
    }

    /// Advances the clock; fires the idle timer if its delay has elapsed since
    /// the last key.
    fn wait(&mut self, ms: u64) {
        if let Some((_, delay)) = self.timer.pending() {
            if ms >= delay.as_millis() as u64 {
                let token = self.timer.fire().expect("pending timer");
                self.detector.on_idle_timer(token);
            }
        }
        self.clock_ms += ms;
    }

    fn key(&mut self, key: &str) -> KeyDisposition {
        self.detector.handle_key(&KeyInput::new(key, self.clock_ms))
    }

    /// Types `text` followed by Enter, `step_ms` between keys.
    fn scan(&mut self, text: &str, step_ms: u64) {
        for c in text.chars() {
            self.key(&c.to_string());
            self.clock_ms += step_ms;
        }
        self.key("Enter");
        self.clock_ms += step_ms;
    }

    fn scans(&self) -> Vec<String> {
        self.scans.lock().unwrap().clone()
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_scanner_burst_is_reported_once() {
    let mut h = Harness::new(DetectorConfig::default());

    h.scan("ABC12", 5);

    assert_eq!(h.scans(), vec!["ABC12"]);
}

#[test]
fn test_pause_between_bursts_keeps_only_second_burst() {
    let mut h = Harness::new(DetectorConfig::default());

    h.key("A");
    h.clock_ms += 5;
    h.key("B");
    h.clock_ms += 500;
    h.scan("CDE", 5);

    assert_eq!(h.scans(), vec!["CDE"]);
}

#[test]
fn test_two_chars_then_enter_is_noise() {
    let mut h = Harness::new(DetectorConfig::default());

    h.scan("AB", 5);

    assert!(h.scans().is_empty());
}

#[test]
fn test_abandoned_burst_does_not_leak_into_next_scan() {
    let mut h = Harness::new(DetectorConfig::default());

    h.key("Q");
    h.clock_ms += 5;
    h.key("W");
    h.wait(300);
    h.scan("LOT-7781", 4);

    assert_eq!(h.scans(), vec!["LOT-7781"]);
}

#[test]
fn test_human_typing_is_never_reported() {
    // A person typing "hello" at 200ms per key, then pressing Enter.
    let mut h = Harness::new(DetectorConfig::default());

    for c in "hello".chars() {
        h.key(&c.to_string());
        h.wait(200);
    }
    h.key("Enter");

    assert!(h.scans().is_empty());
}

#[test]
fn test_shortcuts_between_scans_pass_through() {
    let mut h = Harness::new(DetectorConfig::default());
    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    h.scan("P-100", 3);
    let copy = h
        .detector
        .handle_key(&KeyInput::with_modifiers("c", h.clock_ms, ctrl));
    h.clock_ms += 3;
    h.scan("P-200", 3);

    assert_eq!(copy, KeyDisposition::Ignored);
    assert_eq!(h.scans(), vec!["P-100", "P-200"]);
}

#[test]
fn test_custom_threshold_and_minimum_length() {
    let config = DetectorConfig::new(20, 5).expect("valid config");
    let mut h = Harness::new(config);

    // 30ms spacing exceeds the 20ms threshold: every key restarts the burst.
    h.scan("ABCDEF", 30);
    // Fast but too short.
    h.scan("ABCD", 2);
    // Fast and long enough.
    h.scan("ABCDE", 2);

    assert_eq!(h.scans(), vec!["ABCDE"]);
}

#[test]
fn test_disable_mid_burst_then_reenable() {
    let mut h = Harness::new(DetectorConfig::default());

    h.key("X");
    h.clock_ms += 5;
    h.detector.stop();
    assert!(h.timer.pending().is_none(), "disable must cancel the idle timer");
    h.detector.start();
    h.scan("987", 5);

    assert_eq!(h.scans(), vec!["987"]);
}
