#![forbid(unsafe_code)]

//! `localStorage` backend for the settings record.

use linkpeek_core::settings::{SETTINGS_KEY, SettingsError, SettingsStore};
use web_sys::Storage;

/// Settings store over the page origin's `localStorage`.
///
/// Storage can be missing (sandboxed frames, disabled cookies); every
/// operation then reports [`SettingsError::Unavailable`] and the controller
/// runs on defaults.
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    storage: Option<Storage>,
    key: String,
}

impl LocalStorageStore {
    /// Store under the default settings key.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key(SETTINGS_KEY)
    }

    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        Self {
            storage,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    fn storage(&self) -> Result<&Storage, SettingsError> {
        self.storage
            .as_ref()
            .ok_or_else(|| SettingsError::Unavailable("localStorage".to_owned()))
    }
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for LocalStorageStore {
    fn read(&self) -> Result<Option<String>, SettingsError> {
        self.storage()?
            .get_item(&self.key)
            .map_err(|err| SettingsError::Unavailable(format!("{err:?}")))
    }

    fn write(&mut self, raw: &str) -> Result<(), SettingsError> {
        self.storage()?
            .set_item(&self.key, raw)
            .map_err(|err| SettingsError::Write(format!("{err:?}")))
    }
}
