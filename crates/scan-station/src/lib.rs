//! scan-station library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the station do? (for beginners)
//!
//! `scan-core` knows how to recognise a scan, but it never reads a keyboard,
//! opens a port, or waits for time to pass.  The station is the host that does
//! those things:
//!
//! 1. Reads key-downs from the terminal and byte chunks from a serial scanner.
//! 2. Feeds them, one at a time and in arrival order, into the core detector
//!    and serial framer.
//! 3. Runs their idle timers on Tokio and posts expiries back into the same
//!    event queue.
//! 4. Numbers each recognised scan and broadcasts it to subscribers; the
//!    binary prints them as JSON lines.

/// Application layer: the station event loop and scan publication.
pub mod application;

/// Infrastructure layer: input sources, serial port, timers, configuration.
pub mod infrastructure;
