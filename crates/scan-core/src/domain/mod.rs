//! Domain entities for Scan Station.
//!
//! This module contains plain data types with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application is called the **domain**.  Domain
//! code has **no** imports from OS APIs, terminal libraries, serial drivers, or
//! async runtimes, so it can be compiled and tested anywhere.  The outer layers
//! (the station's application and infrastructure code) depend on these types,
//! never the other way around.

/// Detector and serial framing configuration with validation.
pub mod config;

/// Key-down observations and the rules that classify them.
pub mod key;

/// Scan results as published by a host.
pub mod scan;
