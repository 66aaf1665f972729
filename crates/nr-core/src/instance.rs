//! Nitter instance validation
//!
//! A target base is only ever accepted when it is a bare HTTPS origin whose
//! hostname appears in the allow-list. Validation is local; nothing here
//! touches the network.
//!
//! # Examples
//!
//! ```
//! use nr_core::instance::is_valid_instance;
//!
//! assert!(is_valid_instance("https://xcancel.com"));
//! assert!(!is_valid_instance("https://evil.xcancel.com"));
//! assert!(!is_valid_instance("http://xcancel.com"));
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use url::{Origin, Url};

use crate::error::RedirectError;

// =============================================================================
// Constants
// =============================================================================

/// Instance used when nothing valid is configured.
pub const DEFAULT_INSTANCE: &str = "https://xcancel.com";

/// Operator-approved instance hostnames.
pub const KNOWN_INSTANCES: &[&str] = &[
    "xcancel.com",
    "nitter.poast.org",
    "nitter.privacyredirect.com",
    "lightbrd.com",
    "nitter.space",
    "nitter.tiekoetter.com",
];

/// Shape every candidate string must have: a bare HTTPS origin.
pub const VALID_INSTANCE_PATTERN: &str = r"^https://[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static INSTANCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn instance_regex() -> &'static Regex {
    INSTANCE_REGEX.get_or_init(|| {
        Regex::new(VALID_INSTANCE_PATTERN).expect("instance pattern compiles")
    })
}

// =============================================================================
// Host Matching
// =============================================================================

/// How a hostname is compared against allow-list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMatch {
    /// Hostname must equal an entry.
    #[default]
    Exact,
    /// Hostname may also be any subdomain of an entry. Opt-in only.
    Suffix,
}

impl HostMatch {
    fn matches(self, host: &str, entry: &str) -> bool {
        match self {
            Self::Exact => host == entry,
            Self::Suffix => {
                host == entry
                    || host
                        .strip_suffix(entry)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

// =============================================================================
// Target Base
// =============================================================================

/// A validated redirect destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetBase {
    url: Url,
}

impl TargetBase {
    /// Validate a candidate against the built-in allow-list.
    pub fn parse(candidate: &str) -> Result<Self, RedirectError> {
        InstanceValidator::default().validate(candidate)
    }

    /// The built-in default instance.
    pub fn default_instance() -> Self {
        Self {
            url: Url::parse(DEFAULT_INSTANCE).expect("default instance parses"),
        }
    }

    /// Resolve a stored setting, falling back to the default when the value
    /// is absent, empty or invalid.
    pub fn resolve(stored: Option<&str>) -> Self {
        match stored.filter(|s| !s.is_empty()) {
            Some(candidate) => match Self::parse(candidate) {
                Ok(target) => target,
                Err(e) => {
                    log::warn!("{}; using {}", e, DEFAULT_INSTANCE);
                    Self::default_instance()
                }
            },
            None => Self::default_instance(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hostname of the instance.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn origin(&self) -> Origin {
        self.url.origin()
    }

    /// Origin serialization, e.g. `https://xcancel.com`.
    pub fn as_origin_string(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

impl fmt::Display for TargetBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_origin_string())
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Validates candidate instance URLs against an allow-list.
#[derive(Debug, Clone)]
pub struct InstanceValidator {
    allow_list: Vec<String>,
    host_match: HostMatch,
}

impl Default for InstanceValidator {
    fn default() -> Self {
        Self::new(KNOWN_INSTANCES.iter().copied(), HostMatch::Exact)
    }
}

impl InstanceValidator {
    /// Create a validator over custom allow-list entries.
    pub fn new<'a>(entries: impl IntoIterator<Item = &'a str>, host_match: HostMatch) -> Self {
        Self {
            allow_list: entries.into_iter().map(|e| e.to_ascii_lowercase()).collect(),
            host_match,
        }
    }

    /// Is this hostname allow-listed under the configured matching mode?
    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.allow_list
            .iter()
            .any(|entry| self.host_match.matches(&host, entry))
    }

    /// Validate a candidate, reporting which check failed.
    pub fn validate(&self, candidate: &str) -> Result<TargetBase, RedirectError> {
        let url = Url::parse(candidate)
            .map_err(|_| RedirectError::invalid_target(candidate, "not a URL"))?;

        if url.scheme() != "https" {
            return Err(RedirectError::invalid_target(candidate, "scheme must be https"));
        }

        if !instance_regex().is_match(candidate) {
            return Err(RedirectError::invalid_target(
                candidate,
                "must be a bare https origin",
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| RedirectError::invalid_target(candidate, "missing host"))?;
        if !self.is_allowed_host(host) {
            return Err(RedirectError::invalid_target(candidate, "host not in allow-list"));
        }

        Ok(TargetBase { url })
    }

    pub fn is_valid(&self, candidate: &str) -> bool {
        self.validate(candidate).is_ok()
    }
}

/// Is `candidate` a trusted instance? Exact hostname match, fails closed.
pub fn is_valid_instance(candidate: &str) -> bool {
    InstanceValidator::default().is_valid(candidate)
}

/// Trim user input and return the value the settings UI stores: the origin of
/// a valid instance, or an empty string meaning "use the default".
pub fn normalize_instance(input: &str) -> Result<String, RedirectError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    TargetBase::parse(trimmed).map(|target| target.as_origin_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_instances_are_valid() {
        for host in KNOWN_INSTANCES {
            let candidate = format!("https://{}", host);
            assert!(is_valid_instance(&candidate), "{}", candidate);
        }
    }

    #[test]
    fn test_rejects_subdomain_of_allowed_host() {
        assert!(!is_valid_instance("https://evil.xcancel.com"));
        assert!(!is_valid_instance("https://www.nitter.space"));
    }

    #[test]
    fn test_rejects_lookalike_hosts() {
        assert!(!is_valid_instance("https://xcancel.com.evil.org"));
        assert!(!is_valid_instance("https://notxcancel.com"));
        assert!(!is_valid_instance("https://nitter.net"));
    }

    #[test]
    fn test_rejects_non_https() {
        assert!(!is_valid_instance("http://xcancel.com"));
        assert!(!is_valid_instance("ftp://xcancel.com"));
        assert!(!is_valid_instance("wss://xcancel.com"));
        assert!(!is_valid_instance("javascript:alert(1)"));
    }

    #[test]
    fn test_rejects_paths_ports_and_credentials() {
        assert!(!is_valid_instance("https://xcancel.com/"));
        assert!(!is_valid_instance("https://xcancel.com/search"));
        assert!(!is_valid_instance("https://xcancel.com:8443"));
        assert!(!is_valid_instance("https://user@xcancel.com"));
        assert!(!is_valid_instance("https://xcancel.com?q=1"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(!is_valid_instance(""));
        assert!(!is_valid_instance("xcancel.com"));
        assert!(!is_valid_instance("https://"));
        assert!(!is_valid_instance(" https://xcancel.com"));
    }

    #[test]
    fn test_hostname_case_is_ignored() {
        assert!(is_valid_instance("https://XCancel.com"));
    }

    #[test]
    fn test_validate_reports_reason() {
        let err = TargetBase::parse("http://xcancel.com").unwrap_err();
        assert_eq!(
            err,
            RedirectError::InvalidTargetUrl {
                url: "http://xcancel.com".to_string(),
                reason: "scheme must be https",
            }
        );

        let err = TargetBase::parse("https://evil.xcancel.com").unwrap_err();
        assert!(err.to_string().contains("allow-list"));
    }

    #[test]
    fn test_suffix_match_is_opt_in() {
        let validator = InstanceValidator::new(["xcancel.com"], HostMatch::Suffix);
        assert!(validator.is_valid("https://xcancel.com"));
        assert!(validator.is_valid("https://eu.xcancel.com"));
        assert!(!validator.is_valid("https://notxcancel.com"));

        let exact = InstanceValidator::new(["xcancel.com"], HostMatch::Exact);
        assert!(!exact.is_valid("https://eu.xcancel.com"));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        assert_eq!(TargetBase::resolve(None).host(), "xcancel.com");
        assert_eq!(TargetBase::resolve(Some("")).host(), "xcancel.com");
        assert_eq!(TargetBase::resolve(Some("https://evil.example")).host(), "xcancel.com");
        assert_eq!(
            TargetBase::resolve(Some("https://nitter.poast.org")).host(),
            "nitter.poast.org"
        );
    }

    #[test]
    fn test_target_display_is_origin() {
        let target = TargetBase::parse("https://nitter.space").unwrap();
        assert_eq!(target.to_string(), "https://nitter.space");
        assert_eq!(TargetBase::default_instance().to_string(), DEFAULT_INSTANCE);
    }

    #[test]
    fn test_normalize_instance() {
        assert_eq!(
            normalize_instance("  https://lightbrd.com \n").unwrap(),
            "https://lightbrd.com"
        );
        assert_eq!(normalize_instance("   ").unwrap(), "");
        assert!(normalize_instance("https://example.com").is_err());
    }
}
