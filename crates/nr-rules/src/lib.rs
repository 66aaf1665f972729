//! Nitter Redirect Rule Builder
//!
//! This crate compiles the resolved redirect state into declarative
//! host-rewrite rules and keeps a registrar's rule set in sync with it.

pub mod builder;
pub mod registrar;

pub use builder::{build_rules, build_rules_for_state, owned_rule_ids, RedirectRule};
pub use registrar::{sync_rules, MemoryRegistrar, RegistrarError, RuleRegistrar};
