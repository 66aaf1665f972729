//! Settings UI model
//!
//! Backs the popup: an instance text input validated before it is persisted,
//! and an enable toggle. Rendering is left to the host page.

use crate::instance::normalize_instance;
use crate::settings::{SettingsChange, SettingsStore};

/// Delay between the last keystroke and saving the instance.
pub const INPUT_DEBOUNCE_MS: u64 = 500;

/// Message shown when the typed instance is rejected.
pub const INVALID_INSTANCE_MESSAGE: &str =
    "Please enter a valid HTTPS Nitter instance URL from the supported list";

/// Message shown when saving fails.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save settings";

// =============================================================================
// Debouncer
// =============================================================================

/// Timestamp-driven debouncer.
///
/// `call` registers an invocation; `poll` reports when the trailing edge is due.
/// With `immediate` set, the first call of a burst fires at once and the
/// trailing edge is suppressed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait_ms: u64,
    immediate: bool,
    deadline: Option<u64>,
}

impl Debouncer {
    pub fn new(wait_ms: u64, immediate: bool) -> Self {
        Self {
            wait_ms,
            immediate,
            deadline: None,
        }
    }

    /// Register a call at `now_ms`. Returns true if it should run right away.
    ///
    /// A deadline already in the past counts as idle, so a new burst after a
    /// quiet period fires on its leading edge even if nobody polled.
    pub fn call(&mut self, now_ms: u64) -> bool {
        let idle = self.deadline.map_or(true, |deadline| now_ms >= deadline);
        let call_now = self.immediate && idle;
        self.deadline = Some(now_ms.saturating_add(self.wait_ms));
        call_now
    }

    /// Returns true once when the trailing edge is due.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                !self.immediate
            }
            _ => false,
        }
    }
}

// =============================================================================
// Settings Form
// =============================================================================

/// Result of submitting the instance input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Instance stored as this origin
    Saved(String),
    /// Empty input stored; the default instance applies
    Cleared,
    /// Input rejected; nothing stored
    Rejected,
    /// Store write failed
    SaveFailed,
    /// Form is read-only because settings could not be loaded
    ReadOnly,
}

/// Popup form bound to a settings store.
#[derive(Debug)]
pub struct SettingsForm<S> {
    store: S,
    instance_input: String,
    enabled: bool,
    read_only: bool,
    validity: Option<&'static str>,
    debouncer: Debouncer,
}

impl<S: SettingsStore> SettingsForm<S> {
    /// Populate the form from the store. If the store cannot be read the form
    /// is read-only.
    pub fn load(store: S) -> Self {
        let mut form = Self {
            store,
            instance_input: String::new(),
            enabled: false,
            read_only: false,
            validity: None,
            debouncer: Debouncer::new(INPUT_DEBOUNCE_MS, false),
        };
        match form.store.get() {
            Ok(settings) => {
                form.enabled = !settings.disabled;
                form.instance_input = settings.instance.unwrap_or_default();
            }
            Err(e) => {
                log::error!("popup initialization failed: {}", e);
                form.read_only = true;
            }
        }
        form
    }

    pub fn instance_input(&self) -> &str {
        &self.instance_input
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Current validation message, if the input is in an error state.
    pub fn validity_message(&self) -> Option<&'static str> {
        self.validity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Input event on the instance field.
    pub fn on_input(&mut self, value: &str, now_ms: u64) {
        if self.read_only {
            return;
        }
        self.instance_input = value.to_string();
        self.debouncer.call(now_ms);
    }

    /// Advance time; saves the instance once the debounce window has passed.
    pub fn tick(&mut self, now_ms: u64) -> Option<FormOutcome> {
        if self.debouncer.poll(now_ms) {
            Some(self.submit_instance())
        } else {
            None
        }
    }

    /// Validate and persist the instance input.
    pub fn submit_instance(&mut self) -> FormOutcome {
        if self.read_only {
            return FormOutcome::ReadOnly;
        }

        let normalized = match normalize_instance(&self.instance_input) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("{}", e);
                self.validity = Some(INVALID_INSTANCE_MESSAGE);
                return FormOutcome::Rejected;
            }
        };

        match self.store.set(&SettingsChange::instance(normalized.clone())) {
            Ok(()) => {
                self.validity = None;
                if normalized.is_empty() {
                    FormOutcome::Cleared
                } else {
                    FormOutcome::Saved(normalized)
                }
            }
            Err(e) => {
                log::error!("failed to save instance: {}", e);
                self.validity = Some(SAVE_FAILED_MESSAGE);
                FormOutcome::SaveFailed
            }
        }
    }

    /// Change event on the enable toggle. On failure the toggle reverts.
    pub fn on_toggle(&mut self, checked: bool) -> bool {
        if self.read_only {
            return false;
        }
        self.enabled = checked;
        match self.store.set(&SettingsChange::disabled(!checked)) {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to save toggle state: {}", e);
                self.enabled = !checked;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemoryStore, Settings};

    #[test]
    fn test_debounce_trailing_edge() {
        let mut debouncer = Debouncer::new(10, false);
        assert!(!debouncer.call(0));
        assert!(!debouncer.call(3));
        assert!(!debouncer.call(6));
        assert!(!debouncer.poll(15));
        assert!(debouncer.poll(16));
        assert!(!debouncer.poll(100));
        assert_eq!(debouncer.deadline, None);
    }

    #[test]
    fn test_debounce_leading_edge() {
        let mut debouncer = Debouncer::new(10, true);
        assert!(debouncer.call(0));
        assert!(!debouncer.call(5));
        assert!(!debouncer.poll(20));
        assert!(debouncer.call(30));
    }

    #[test]
    fn test_debounce_leading_edge_rearms_without_poll() {
        let mut debouncer = Debouncer::new(10, true);
        assert!(debouncer.call(0));
        assert!(!debouncer.call(9));
        // Quiet since 9; deadline 19 has passed
        assert!(debouncer.call(100));
        assert!(!debouncer.call(105));
        assert!(!debouncer.poll(200));
    }

    #[test]
    fn test_load_populates_fields() {
        let store = MemoryStore::new(Settings {
            instance: Some("https://nitter.space".to_string()),
            disabled: true,
        });
        let form = SettingsForm::load(store);
        assert_eq!(form.instance_input(), "https://nitter.space");
        assert!(!form.is_enabled());
        assert!(!form.is_read_only());
    }

    #[test]
    fn test_valid_input_saved_after_debounce() {
        let mut form = SettingsForm::load(MemoryStore::default());
        form.on_input("https://nitter.", 0);
        form.on_input(" https://nitter.space ", 200);
        assert_eq!(form.tick(600), None);
        assert_eq!(
            form.tick(700),
            Some(FormOutcome::Saved("https://nitter.space".to_string()))
        );
        assert_eq!(
            form.store().get().unwrap().instance.as_deref(),
            Some("https://nitter.space")
        );
        assert_eq!(form.validity_message(), None);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let mut form = SettingsForm::load(MemoryStore::default());
        form.on_input("https://evil.xcancel.com", 0);
        assert_eq!(form.tick(500), Some(FormOutcome::Rejected));
        assert_eq!(form.validity_message(), Some(INVALID_INSTANCE_MESSAGE));
        assert_eq!(form.store().get().unwrap().instance, None);
    }

    #[test]
    fn test_empty_input_clears() {
        let store = MemoryStore::new(Settings {
            instance: Some("https://nitter.space".to_string()),
            disabled: false,
        });
        let mut form = SettingsForm::load(store);
        form.on_input("", 0);
        assert_eq!(form.tick(500), Some(FormOutcome::Cleared));
        assert_eq!(form.store().get().unwrap().instance.as_deref(), Some(""));
    }

    #[test]
    fn test_toggle_persists_inverse() {
        let mut form = SettingsForm::load(MemoryStore::default());
        assert!(form.on_toggle(false));
        assert!(form.store().get().unwrap().disabled);
        assert!(form.on_toggle(true));
        assert!(!form.store().get().unwrap().disabled);
    }

    #[test]
    fn test_toggle_reverts_on_failure() {
        let mut form = SettingsForm::load(MemoryStore::default());
        assert!(form.is_enabled());
        form.store.set_unavailable(true);
        assert!(!form.on_toggle(false));
        assert!(form.is_enabled());
        assert_eq!(form.submit_instance(), FormOutcome::SaveFailed);
        assert_eq!(form.validity_message(), Some(SAVE_FAILED_MESSAGE));
    }

    #[test]
    fn test_unreadable_store_makes_form_read_only() {
        let mut form = SettingsForm::load(MemoryStore::unavailable());
        assert!(form.is_read_only());
        form.on_input("https://nitter.space", 0);
        assert_eq!(form.instance_input(), "");
        assert_eq!(form.tick(1_000), None);
        assert_eq!(form.submit_instance(), FormOutcome::ReadOnly);
        assert!(!form.on_toggle(true));
    }
}
