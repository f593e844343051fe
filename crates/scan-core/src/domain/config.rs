//! Detector configuration types.
//!
//! [`DetectorConfig`] is the single source of truth for the keyboard
//! detector's timing rules, and [`SerialFramingConfig`] for the serial framer.
//! Both are plain structs with sensible defaults; the host decides where the
//! values come from (config file, CLI, a settings screen).
//!
//! # Why are these not constants?
//!
//! The defaults (80ms between keys, at least 3 characters, idle flush after
//! 3x the key gap, 150ms serial quiet period) are product-tuning values, not
//! derived from a model.  A very fast typist and a slow scanner overlap, so
//! sites with unusual hardware need to adjust them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum gap between keys of one burst.
pub const DEFAULT_INTER_KEY_THRESHOLD_MS: u64 = 80;
/// Default minimum number of characters for a scan to be forwarded.
pub const DEFAULT_MINIMUM_SCAN_LENGTH: usize = 3;
/// The idle flush fires after this many thresholds without a key.
pub const IDLE_FLUSH_MULTIPLIER: u64 = 3;
/// Default quiet period that ends a serial scan.
pub const DEFAULT_SERIAL_IDLE_FLUSH_MS: u64 = 150;

/// Error type for configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("inter-key threshold must be greater than zero")]
    ZeroThreshold,
    #[error("minimum scan length must be at least 1")]
    ZeroMinimumLength,
    #[error("serial idle flush must be greater than zero")]
    ZeroIdleFlush,
}

/// Timing rules for the keyboard detector.
///
/// # Example
///
/// ```rust
/// use scan_core::DetectorConfig;
///
/// let cfg = DetectorConfig::default();
/// assert_eq!(cfg.inter_key_threshold_ms, 80);
/// assert_eq!(cfg.idle_flush_delay().as_millis(), 240);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Largest gap between two keys that still counts as one burst.
    pub inter_key_threshold_ms: u64,
    /// Shorter scans are dropped as noise.
    pub minimum_scan_length: usize,
}

impl DetectorConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroThreshold`] or [`ConfigError::ZeroMinimumLength`].
    pub fn new(inter_key_threshold_ms: u64, minimum_scan_length: usize) -> Result<Self, ConfigError> {
        let cfg = Self {
            inter_key_threshold_ms,
            minimum_scan_length,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the invariants of a configuration built by hand or deserialized.
    ///
    /// # Errors
    ///
    /// See [`DetectorConfig::new`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inter_key_threshold_ms == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.minimum_scan_length == 0 {
            return Err(ConfigError::ZeroMinimumLength);
        }
        Ok(())
    }

    /// Idle period after which an unterminated burst is discarded.
    pub fn idle_flush_ms(&self) -> u64 {
        self.inter_key_threshold_ms.saturating_mul(IDLE_FLUSH_MULTIPLIER)
    }

    /// [`idle_flush_ms`](Self::idle_flush_ms) as a `Duration`.
    pub fn idle_flush_delay(&self) -> Duration {
        Duration::from_millis(self.idle_flush_ms())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            inter_key_threshold_ms: DEFAULT_INTER_KEY_THRESHOLD_MS,
            minimum_scan_length: DEFAULT_MINIMUM_SCAN_LENGTH,
        }
    }
}

/// Framing rules for serial scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialFramingConfig {
    /// Quiet period after the last byte that completes a scan.
    pub idle_flush_ms: u64,
}

impl SerialFramingConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroIdleFlush`] for a zero quiet period.
    pub fn new(idle_flush_ms: u64) -> Result<Self, ConfigError> {
        if idle_flush_ms == 0 {
            return Err(ConfigError::ZeroIdleFlush);
        }
        Ok(Self { idle_flush_ms })
    }

    pub fn idle_flush_delay(&self) -> Duration {
        Duration::from_millis(self.idle_flush_ms)
    }
}

impl Default for SerialFramingConfig {
    fn default() -> Self {
        Self {
            idle_flush_ms: DEFAULT_SERIAL_IDLE_FLUSH_MS,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
