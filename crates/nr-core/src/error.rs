//! Error types for Nitter Redirect.
//!
//! None of these are fatal: every caller has a "do not redirect" fallback.

/// Error type for validation, rewriting and settings access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedirectError {
    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: &'static str },
    #[error("Unparsable source URL '{0}'")]
    UnparsableSourceUrl(String),
    #[error("Settings access failed: {0}")]
    SettingsAccess(String),
}

impl RedirectError {
    pub(crate) fn invalid_target(url: &str, reason: &'static str) -> Self {
        Self::InvalidTargetUrl {
            url: url.to_string(),
            reason,
        }
    }
}
