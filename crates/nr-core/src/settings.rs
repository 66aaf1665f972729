//! Settings model and store interface
//!
//! The extension keeps two keys in synced browser storage: `instance` and
//! `nitterDisabled`. [`Settings`] mirrors them with the same serialized
//! names, and [`SettingsChange`] carries the subset a change event reports.

use serde::{Deserialize, Serialize};

use crate::error::RedirectError;

/// Storage key of the target base.
pub const INSTANCE_KEY: &str = "instance";
/// Storage key of the disabled flag.
pub const DISABLED_KEY: &str = "nitterDisabled";

// =============================================================================
// Settings
// =============================================================================

/// Persisted settings pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Target base as typed by the user; empty or absent means the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, rename = "nitterDisabled")]
    pub disabled: bool,
}

impl Settings {
    /// Apply a change event in place.
    pub fn apply(&mut self, change: &SettingsChange) {
        if let Some(instance) = &change.instance {
            self.instance = instance.clone();
        }
        if let Some(disabled) = change.disabled {
            self.disabled = disabled;
        }
    }

    /// The change that would turn `self` into `next`.
    pub fn diff(&self, next: &Settings) -> SettingsChange {
        SettingsChange {
            instance: (self.instance != next.instance).then(|| next.instance.clone()),
            disabled: (self.disabled != next.disabled).then_some(next.disabled),
        }
    }
}

/// Subset of settings reported by a change notification.
///
/// `instance: Some(None)` means the key was removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub instance: Option<Option<String>>,
    pub disabled: Option<bool>,
}

impl SettingsChange {
    pub fn instance(value: impl Into<String>) -> Self {
        Self {
            instance: Some(Some(value.into())),
            disabled: None,
        }
    }

    pub fn disabled(value: bool) -> Self {
        Self {
            instance: None,
            disabled: Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instance.is_none() && self.disabled.is_none()
    }
}

// =============================================================================
// Store Interface
// =============================================================================

/// Callback fired with the changed subset after a successful write.
pub type ChangeListener = Box<dyn FnMut(&SettingsChange)>;

/// Host key-value store holding [`Settings`].
pub trait SettingsStore {
    /// Read both keys.
    fn get(&self) -> Result<Settings, RedirectError>;

    /// Write the keys present in `change`.
    fn set(&mut self, change: &SettingsChange) -> Result<(), RedirectError>;

    /// Register a change listener.
    fn subscribe(&mut self, listener: ChangeListener);
}

/// Listener registry shared by store implementations.
#[derive(Default)]
pub struct Listeners {
    listeners: Vec<ChangeListener>,
}

impl Listeners {
    pub fn push(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    /// Notify every listener, skipping empty changes.
    pub fn notify(&mut self, change: &SettingsChange) {
        if change.is_empty() {
            return;
        }
        for listener in &mut self.listeners {
            listener(change);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("count", &self.listeners.len()).finish()
    }
}

/// In-memory store. Can be switched to fail every access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Settings,
    listeners: Listeners,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// A store whose every access fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check(&self) -> Result<(), RedirectError> {
        if self.unavailable {
            return Err(RedirectError::SettingsAccess("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self) -> Result<Settings, RedirectError> {
        self.check()?;
        Ok(self.settings.clone())
    }

    fn set(&mut self, change: &SettingsChange) -> Result<(), RedirectError> {
        self.check()?;
        let mut next = self.settings.clone();
        next.apply(change);
        let effective = self.settings.diff(&next);
        self.settings = next;
        self.listeners.notify(&effective);
        Ok(())
    }

    fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_settings_serde_keys() {
        let settings = Settings {
            instance: Some("https://xcancel.com".to_string()),
            disabled: true,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"instance":"https://xcancel.com","nitterDisabled":true}"#);

        let parsed: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_apply_and_diff() {
        let mut settings = Settings::default();
        settings.apply(&SettingsChange::instance("https://nitter.space"));
        assert_eq!(settings.instance.as_deref(), Some("https://nitter.space"));
        assert!(!settings.disabled);

        let next = Settings {
            instance: settings.instance.clone(),
            disabled: true,
        };
        assert_eq!(settings.diff(&next), SettingsChange::disabled(true));
        assert!(settings.diff(&settings).is_empty());
    }

    #[test]
    fn test_removed_instance() {
        let mut settings = Settings {
            instance: Some("https://nitter.space".to_string()),
            disabled: false,
        };
        settings.apply(&SettingsChange {
            instance: Some(None),
            disabled: None,
        });
        assert_eq!(settings.instance, None);
    }

    #[test]
    fn test_memory_store_notifies_changed_subset() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = MemoryStore::new(Settings::default());
        let sink = Rc::clone(&seen);
        store.subscribe(Box::new(move |change: &SettingsChange| {
            sink.borrow_mut().push(change.clone())
        }));

        store.set(&SettingsChange::disabled(true)).unwrap();
        // Same value again: nothing changes, nothing fires
        store.set(&SettingsChange::disabled(true)).unwrap();
        store.set(&SettingsChange::instance("https://lightbrd.com")).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], SettingsChange::disabled(true));
        assert_eq!(seen[1], SettingsChange::instance("https://lightbrd.com"));
        assert!(store.get().unwrap().disabled);
    }

    #[test]
    fn test_unavailable_store() {
        let mut store = MemoryStore::unavailable();
        assert!(matches!(store.get(), Err(RedirectError::SettingsAccess(_))));
        assert!(store.set(&SettingsChange::disabled(true)).is_err());

        store.set_unavailable(false);
        assert_eq!(store.get().unwrap(), Settings::default());
    }
}
