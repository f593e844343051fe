//! Application layer use cases for the scan station.
//!
//! Use cases in this layer orchestrate the `scan-core` types to fulfil a goal
//! and depend on traits rather than concrete OS adapters, so they can be
//! exercised with synthetic events.
//!
//! # Sub-modules
//!
//! - **`detect_scans`** – The station event loop.  Receives key-downs, serial
//!   chunks, timer expiries and control messages from a single queue and
//!   dispatches each to the keyboard detector or serial framer.  This runs on
//!   every keystroke.
//!
//! - **`publish_scans`** – Numbers recognised scans and fans them out to any
//!   number of subscribers.

pub mod detect_scans;
pub mod publish_scans;
