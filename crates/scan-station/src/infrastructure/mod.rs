//! Infrastructure layer for the scan station.
//!
//! Contains OS-facing adapters: the terminal keyboard source, the serial
//! scanner reader, the Tokio-backed idle timer, configuration storage, and the
//! wiring that assembles a [`ScanStation`](crate::application::detect_scans::ScanStation)
//! from configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and `scan_core`,
//! but `scan_core` MUST NOT import anything from here.

pub mod bootstrap;
pub mod input_capture;
pub mod serial;
pub mod storage;
pub mod timer;
