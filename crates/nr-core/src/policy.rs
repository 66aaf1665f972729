//! Redirect policy
//!
//! Decides, for one source URL, whether to redirect and where. The resolved
//! `(target, disabled)` pair lives in an explicit [`Redirector`] that is
//! rebuilt on every settings change; nothing here keeps global state.

use std::sync::Arc;

use arc_swap::ArcSwap;
use url::Url;

use crate::error::RedirectError;
use crate::instance::TargetBase;
use crate::rewrite::rewrite;
use crate::settings::{Settings, SettingsChange, SettingsStore};
use crate::source::classify_host;
use crate::types::{InterceptResponse, RedirectDecision, SkipReason};

// =============================================================================
// Stateless Decision
// =============================================================================

/// Decide for raw inputs.
///
/// The target is validated here; an invalid target never produces a redirect.
pub fn decide(disabled: bool, target_base: &str, source: &str) -> RedirectDecision {
    if disabled {
        return RedirectDecision::Skip(SkipReason::Disabled);
    }
    match TargetBase::parse(target_base) {
        Ok(target) => decide_for_target(&target, source),
        Err(e) => {
            log::debug!("{}", e);
            RedirectDecision::Skip(SkipReason::InvalidTarget)
        }
    }
}

fn decide_for_target(target: &TargetBase, source: &str) -> RedirectDecision {
    let source = match Url::parse(source) {
        Ok(url) => url,
        Err(_) => {
            log::debug!("{}", RedirectError::UnparsableSourceUrl(source.to_string()));
            return RedirectDecision::Skip(SkipReason::UnparsableSource);
        }
    };

    if source.origin() == target.origin() {
        return RedirectDecision::Skip(SkipReason::SameOrigin);
    }

    if source.host_str().and_then(classify_host).is_none() {
        return RedirectDecision::Skip(SkipReason::UnwatchedHost);
    }

    match rewrite(&source, target) {
        Some(url) => {
            log::debug!("redirect {} -> {}", source, url);
            RedirectDecision::Redirect(url)
        }
        None => RedirectDecision::Skip(SkipReason::RewriteFailed),
    }
}

// =============================================================================
// State Machine
// =============================================================================

/// Resolved redirect state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectState {
    Enabled(TargetBase),
    Disabled,
}

impl RedirectState {
    /// Resolve settings; an absent or invalid instance falls back to the default.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.disabled {
            Self::Disabled
        } else {
            Self::Enabled(TargetBase::resolve(settings.instance.as_deref()))
        }
    }

    pub fn target(&self) -> Option<&TargetBase> {
        match self {
            Self::Enabled(target) => Some(target),
            Self::Disabled => None,
        }
    }

    pub fn evaluate(&self, source: &str) -> RedirectDecision {
        match self {
            Self::Enabled(target) => decide_for_target(target, source),
            Self::Disabled => RedirectDecision::Skip(SkipReason::Disabled),
        }
    }
}

/// Navigation interception hook.
pub trait Interceptor {
    /// Called before a navigation to `request_url` proceeds.
    fn on_before_navigate(&self, request_url: &str) -> InterceptResponse;
}

/// Owns the settings mirror and the state derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirector {
    settings: Settings,
    state: RedirectState,
}

impl Default for Redirector {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Redirector {
    pub fn new(settings: Settings) -> Self {
        let state = RedirectState::from_settings(&settings);
        Self { settings, state }
    }

    /// A redirector that never redirects; used when settings cannot be read.
    pub fn inert() -> Self {
        Self::new(Settings {
            instance: None,
            disabled: true,
        })
    }

    /// Read the initial settings from a store.
    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Result<Self, RedirectError> {
        store.get().map(Self::new)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &RedirectState {
        &self.state
    }

    /// Handle a settings change notification. Returns true when the resolved
    /// state changed.
    pub fn apply_change(&mut self, change: &SettingsChange) -> bool {
        self.settings.apply(change);
        let next = RedirectState::from_settings(&self.settings);
        if next == self.state {
            return false;
        }
        log::debug!("redirect state {:?} -> {:?}", self.state, next);
        self.state = next;
        true
    }

    pub fn evaluate(&self, source: &str) -> RedirectDecision {
        self.state.evaluate(source)
    }

    /// Replacement URL for `source`, if any.
    pub fn redirect_for(&self, source: &str) -> Option<String> {
        match self.evaluate(source) {
            RedirectDecision::Redirect(url) => Some(url.into()),
            RedirectDecision::Skip(_) => None,
        }
    }
}

impl Interceptor for Redirector {
    fn on_before_navigate(&self, request_url: &str) -> InterceptResponse {
        self.evaluate(request_url).into()
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// Redirector shared between threads.
///
/// Readers load the current `Arc` snapshot without locking; the change
/// handler builds the next redirector and swaps it in.
#[derive(Debug, Default)]
pub struct SharedRedirector {
    current: ArcSwap<Redirector>,
}

impl SharedRedirector {
    pub fn new(redirector: Redirector) -> Self {
        Self {
            current: ArcSwap::from_pointee(redirector),
        }
    }

    pub fn snapshot(&self) -> Arc<Redirector> {
        self.current.load_full()
    }

    /// Apply a settings change to the current snapshot. Returns true when the
    /// resolved state changed.
    pub fn apply_change(&self, change: &SettingsChange) -> bool {
        let mut changed = false;
        self.current.rcu(|current| {
            let mut next = Redirector::clone(current);
            changed = next.apply_change(change);
            Arc::new(next)
        });
        changed
    }

    pub fn evaluate(&self, source: &str) -> RedirectDecision {
        self.current.load().evaluate(source)
    }
}

impl Interceptor for SharedRedirector {
    fn on_before_navigate(&self, request_url: &str) -> InterceptResponse {
        self.evaluate(request_url).into()
    }
}
