//! Nitter Redirect Core Library
//!
//! This crate holds the decision logic shared by every entry point of the
//! Nitter Redirect extension: which front-end instances are trusted, how a
//! Twitter/X URL maps onto an instance, and when a navigation must be left alone.
//!
//! # Architecture
//!
//! Everything here is a pure function over URLs plus a small owned state object.
//! Browser facilities (sync storage, declarative rules, request interception)
//! are modelled as traits so the extension bindings and the CLI stay thin.
//! Every failure path degrades to "do not redirect".
//!
//! # Modules
//!
//! - `instance`: allow-list and target base validation
//! - `source`: watched Twitter/X hostnames and their classification
//! - `rewrite`: source URL to instance URL transform
//! - `policy`: redirect decisions and the enabled/disabled state machine
//! - `settings`: settings model, change events and the store interface
//! - `form`: settings UI model with input debouncing
//! - `types`: shared type definitions
//! - `error`: error taxonomy

pub mod error;
pub mod form;
pub mod instance;
pub mod policy;
pub mod rewrite;
pub mod settings;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use error::RedirectError;
pub use instance::{
    is_valid_instance, normalize_instance, HostMatch, InstanceValidator, TargetBase,
};
pub use policy::{decide, Interceptor, RedirectState, Redirector, SharedRedirector};
pub use rewrite::{rewrite, rewrite_url};
pub use settings::{MemoryStore, Settings, SettingsChange, SettingsStore};
pub use types::{InterceptResponse, RedirectDecision, ResourceType, SkipReason, SourceKind};
