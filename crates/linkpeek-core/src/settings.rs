#![forbid(unsafe_code)]

//! Persisted preview settings.
//!
//! The record is stored as a single JSON value under [`SETTINGS_KEY`] in the
//! host's per-origin key-value storage. Field names are camelCase
//! (`isDragMode`, `minWidth`, ...) so records written by other link preview
//! builds on the same origin keep loading.
//!
//! # Failure Modes
//!
//! - Absent fields take their default value.
//! - An unparseable record is discarded and defaults are used.
//! - Non-finite or non-positive numbers are replaced by defaults
//!   ([`Settings::sanitized`]).
//! - Write failures are reported to the caller; the controller logs them and
//!   keeps running with the in-memory record.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Size;
use crate::gesture::GestureMode;

/// Storage key for the settings record.
pub const SETTINGS_KEY: &str = "linkPreviewSettings";

const DEFAULT_WIDTH: f64 = 500.0;
const DEFAULT_HEIGHT: f64 = 400.0;
const DEFAULT_MIN_WIDTH: f64 = 300.0;
const DEFAULT_MIN_HEIGHT: f64 = 200.0;
const DEFAULT_DRAG_THRESHOLD: f64 = 30.0;

/// Errors surfaced by a [`SettingsStore`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode settings: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("settings storage unavailable: {0}")]
    Unavailable(String),
    #[error("settings storage rejected write: {0}")]
    Write(String),
}

/// Window geometry and gesture mode, persisted per origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Drag mode when `true`, click-and-hold mode otherwise.
    #[serde(rename = "isDragMode")]
    pub drag_mode_enabled: bool,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub min_height: f64,
    /// Pointer travel (px) that turns a press into a preview in drag mode.
    pub drag_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            drag_mode_enabled: true,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
        }
    }
}

impl Settings {
    /// Parse a stored record, filling absent fields from defaults.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        serde_json::from_str::<Self>(raw)
            .map(Self::sanitized)
            .map_err(SettingsError::Decode)
    }

    /// Encode the record for storage.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        serde_json::to_string(self).map_err(SettingsError::Encode)
    }

    /// Replace unusable numbers with defaults.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let pick = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            drag_mode_enabled: self.drag_mode_enabled,
            width: pick(self.width, defaults.width),
            height: pick(self.height, defaults.height),
            min_width: pick(self.min_width, defaults.min_width),
            min_height: pick(self.min_height, defaults.min_height),
            drag_threshold: pick(self.drag_threshold, defaults.drag_threshold),
        }
    }

    /// Preferred window size.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Smallest size a window may be resized to.
    #[must_use]
    pub const fn min_size(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }

    #[must_use]
    pub const fn gesture_mode(&self) -> GestureMode {
        if self.drag_mode_enabled {
            GestureMode::Drag
        } else {
            GestureMode::Hold
        }
    }
}

/// Durable key-value backend for the settings record.
pub trait SettingsStore {
    /// Read the raw stored record, `None` when nothing was saved yet.
    fn read(&self) -> Result<Option<String>, SettingsError>;

    /// Replace the stored record.
    fn write(&mut self, raw: &str) -> Result<(), SettingsError>;
}

/// Load settings from `store`, falling back to defaults on any failure.
pub fn load(store: &impl SettingsStore) -> Settings {
    let raw = match store.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return Settings::default(),
        Err(err) => {
            debug!(target: "linkpeek::settings", error = %err, "settings read failed; using defaults");
            return Settings::default();
        }
    };
    match Settings::from_json(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            debug!(target: "linkpeek::settings", error = %err, "stored settings discarded");
            Settings::default()
        }
    }
}

/// Persist `settings` to `store`.
pub fn save(store: &mut impl SettingsStore, settings: &Settings) -> Result<(), SettingsError> {
    let raw = settings.to_json()?;
    store.write(&raw)
}

/// In-memory store, used by native hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<String>,
    writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a raw record.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: Some(raw.into()),
            writes: 0,
        }
    }

    /// The raw record currently stored.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Number of successful writes.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl SettingsStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, SettingsError> {
        Ok(self.value.clone())
    }

    fn write(&mut self, raw: &str) -> Result<(), SettingsError> {
        self.value = Some(raw.to_owned());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_store_yields_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load(&store), Settings::default());
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            drag_mode_enabled: false,
            width: 640.0,
            height: 480.0,
            min_width: 320.0,
            min_height: 240.0,
            drag_threshold: 42.5,
        };
        save(&mut store, &settings).unwrap();
        assert_eq!(load(&store), settings);
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn uses_legacy_field_names() {
        let raw = Settings::default().to_json().unwrap();
        for key in [
            "isDragMode",
            "width",
            "height",
            "minWidth",
            "minHeight",
            "dragThreshold",
        ] {
            assert!(raw.contains(&format!("\"{key}\"")), "missing {key} in {raw}");
        }
    }

    #[test]
    fn partial_record_merges_over_defaults() {
        let store = MemoryStore::with_raw(r#"{"isDragMode":false,"width":720}"#);
        let settings = load(&store);
        assert!(!settings.drag_mode_enabled);
        assert_eq!(settings.width, 720.0);
        assert_eq!(settings.height, DEFAULT_HEIGHT);
        assert_eq!(settings.drag_threshold, DEFAULT_DRAG_THRESHOLD);
    }

    #[test]
    fn garbage_record_falls_back_to_defaults() {
        let store = MemoryStore::with_raw("{not json");
        assert_eq!(load(&store), Settings::default());
    }

    #[test]
    fn non_positive_numbers_are_sanitized() {
        let store = MemoryStore::with_raw(r#"{"width":0,"height":-5,"dragThreshold":12}"#);
        let settings = load(&store);
        assert_eq!(settings.width, DEFAULT_WIDTH);
        assert_eq!(settings.height, DEFAULT_HEIGHT);
        assert_eq!(settings.drag_threshold, 12.0);
    }

    #[test]
    fn gesture_mode_follows_flag() {
        let mut settings = Settings::default();
        assert_eq!(settings.gesture_mode(), GestureMode::Drag);
        settings.drag_mode_enabled = false;
        assert_eq!(settings.gesture_mode(), GestureMode::Hold);
    }
}
