//! Key-down observations fed to the detector.
//!
//! Key names follow the DOM `KeyboardEvent.key` convention: a printable key is
//! the character it produces (`"a"`, `"A"`, `"7"`, `"-"`), and every other key
//! has a multi-character name (`"Enter"`, `"Shift"`, `"ArrowLeft"`, `"F5"`).
//! Input sources are responsible for producing names in this form.

use serde::{Deserialize, Serialize};

/// The key that ends a scan.
pub const TERMINATOR_KEY: &str = "Enter";

/// Modifier keys held while a key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    /// Shift does not disqualify a keystroke: scanners type upper-case
    /// letters and symbols with Shift held.
    pub shift: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        meta: false,
        shift: false,
    };

    /// Returns `true` if Ctrl, Alt or Meta is held.
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// A single key-down observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    /// DOM-style key name.
    pub key: String,
    /// Arrival time in milliseconds on the source's monotonic clock.
    pub timestamp_ms: u64,
    pub modifiers: Modifiers,
}

impl KeyInput {
    /// Creates an unmodified key-down at `timestamp_ms`.
    pub fn new(key: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            key: key.into(),
            timestamp_ms,
            modifiers: Modifiers::NONE,
        }
    }

    /// Creates a key-down with the given modifiers.
    pub fn with_modifiers(key: impl Into<String>, timestamp_ms: u64, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            timestamp_ms,
            modifiers,
        }
    }

    /// Returns `true` for the scan terminator.
    pub fn is_terminator(&self) -> bool {
        self.key == TERMINATOR_KEY
    }

    /// Returns the character this key contributes to a scan, if any.
    ///
    /// A keystroke qualifies when its name is exactly one printable character
    /// and no Ctrl/Alt/Meta modifier is held.
    pub fn scan_char(&self) -> Option<char> {
        if self.modifiers.has_command_modifier() {
            return None;
        }
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
