//! ScanBroadcaster: numbers recognised scans and fans them out.
//!
//! Any number of consumers can [`subscribe`](ScanBroadcaster::subscribe);
//! dropping the returned receiver unsubscribes.  The core detector and framer
//! publish through a [`BroadcastSink`], which is a plain [`ScanSink`], so they
//! stay unaware of the channel.
//!
//! Publishing while nobody is subscribed is not an error: the scan is still
//! numbered and remembered as the last scan.

use std::sync::{Arc, Mutex};

use scan_core::{ScanEvent, ScanSink, ScanSource, SequenceCounter};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Default number of scans a slow subscriber may fall behind before it starts
/// losing the oldest ones.
pub const DEFAULT_SCAN_CHANNEL_CAPACITY: usize = 64;

/// Publishes scans to all subscribers.
#[derive(Debug, Clone)]
pub struct ScanBroadcaster {
    tx: broadcast::Sender<ScanEvent>,
    sequence: Arc<SequenceCounter>,
    last: Arc<Mutex<Option<ScanEvent>>>,
}

impl ScanBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` scans per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (a `tokio::sync::broadcast` requirement).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sequence: Arc::new(SequenceCounter::new()),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns a receiver for every scan published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// The most recently published scan.
    pub fn last_scanned(&self) -> Option<ScanEvent> {
        self.last.lock().expect("lock poisoned").clone()
    }

    /// Numbers `barcode` and sends it to all subscribers.
    pub fn publish(&self, source: ScanSource, barcode: String) -> ScanEvent {
        let event = ScanEvent {
            sequence: self.sequence.next(),
            source,
            barcode,
        };
        info!(sequence = event.sequence, source = ?event.source, "scan published");
        *self.last.lock().expect("lock poisoned") = Some(event.clone());
        if self.tx.send(event.clone()).is_err() {
            debug!(sequence = event.sequence, "no scan subscribers");
        }
        event
    }

    /// Returns a [`ScanSink`] that publishes with the given source tag.
    pub fn sink(&self, source: ScanSource) -> BroadcastSink {
        BroadcastSink {
            broadcaster: self.clone(),
            source,
        }
    }
}

impl Default for ScanBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_CHANNEL_CAPACITY)
    }
}

/// A [`ScanSink`] bound to one [`ScanBroadcaster`] and source.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    broadcaster: ScanBroadcaster,
    source: ScanSource,
}

impl ScanSink for BroadcastSink {
    fn on_scan(&mut self, barcode: String) {
        self.broadcaster.publish(self.source, barcode);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
