//! Rule registrar interface and synchronization

use std::collections::BTreeMap;

use nr_core::policy::RedirectState;

use crate::builder::{build_rules_for_state, owned_rule_ids, RedirectRule};

/// Error type for rule registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrarError {
    #[error("Rule update rejected: {0}")]
    Rejected(String),
    #[error("Duplicate rule id: {0}")]
    DuplicateId(u32),
}

/// Host facility holding dynamic declarative rules.
pub trait RuleRegistrar {
    /// Remove `remove_ids`, then add `add_rules`.
    fn update_rules(
        &mut self,
        remove_ids: &[u32],
        add_rules: &[RedirectRule],
    ) -> Result<(), RegistrarError>;
}

/// Replace the registrar's owned rules with the ones for `state`.
///
/// Every owned ID is removed first, so repeated calls never leave stale
/// rules behind. Returns the number of rules added.
pub fn sync_rules<R: RuleRegistrar + ?Sized>(
    registrar: &mut R,
    state: &RedirectState,
) -> Result<usize, RegistrarError> {
    registrar.update_rules(&owned_rule_ids(), &[])?;

    let rules = build_rules_for_state(state);
    if rules.is_empty() {
        log::debug!("not adding rules - disabled");
        return Ok(0);
    }

    registrar.update_rules(&[], &rules)?;
    log::debug!("registered {} redirect rules", rules.len());
    Ok(rules.len())
}

/// In-memory registrar with browser semantics: adding an existing ID fails.
#[derive(Debug, Default)]
pub struct MemoryRegistrar {
    rules: BTreeMap<u32, RedirectRule>,
}

impl MemoryRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> impl Iterator<Item = &RedirectRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleRegistrar for MemoryRegistrar {
    fn update_rules(
        &mut self,
        remove_ids: &[u32],
        add_rules: &[RedirectRule],
    ) -> Result<(), RegistrarError> {
        for id in remove_ids {
            self.rules.remove(id);
        }
        if let Some(rule) = add_rules.iter().find(|r| self.rules.contains_key(&r.id)) {
            return Err(RegistrarError::DuplicateId(rule.id));
        }
        for rule in add_rules {
            self.rules.insert(rule.id, rule.clone());
        }
        Ok(())
    }
}
