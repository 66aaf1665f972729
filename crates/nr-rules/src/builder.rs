//! Declarative redirect rules
//!
//! One rule per watched page domain, each replacing scheme and host with the
//! instance's. Serializes to the browser's declarative rule JSON.

use serde::{Deserialize, Serialize};

use nr_core::instance::TargetBase;
use nr_core::policy::RedirectState;
use nr_core::source::REDIRECT_DOMAINS;
use nr_core::types::ResourceType;

/// Priority of every generated rule.
pub const RULE_PRIORITY: u32 = 1;

/// IDs of rules this extension owns, one per page domain starting at 1.
pub fn owned_rule_ids() -> Vec<u32> {
    (1..=REDIRECT_DOMAINS.len() as u32).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub redirect: Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub transform: Transform,
}

/// URL components the browser replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub scheme: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<String>,
}

impl RedirectRule {
    /// Rule sending `domain` to the target's host.
    pub fn new(id: u32, domain: &str, target: &TargetBase) -> Self {
        Self {
            id,
            priority: RULE_PRIORITY,
            action: RuleAction {
                kind: "redirect".to_string(),
                redirect: Redirect {
                    transform: Transform {
                        scheme: target.url().scheme().to_string(),
                        host: target.host().to_string(),
                    },
                },
            },
            condition: RuleCondition {
                url_filter: format!("||{}", domain),
                resource_types: ResourceType::DOCUMENT
                    .names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
        }
    }
}

/// Rules redirecting every page domain to `target`.
pub fn build_rules(target: &TargetBase) -> Vec<RedirectRule> {
    REDIRECT_DOMAINS
        .iter()
        .zip(owned_rule_ids())
        .map(|(domain, id)| RedirectRule::new(id, domain, target))
        .collect()
}

/// Rules for a resolved state; none while disabled.
pub fn build_rules_for_state(state: &RedirectState) -> Vec<RedirectRule> {
    match state.target() {
        Some(target) => build_rules(target),
        None => Vec::new(),
    }
}
