//! Core type definitions for Nitter Redirect
//!
//! These types are shared by the rewriter, the redirect policy and the
//! host bindings.

use url::Url;

// =============================================================================
// Resource Types (bit mask for declarative rule conditions)
// =============================================================================

bitflags::bitflags! {
    /// Document resource types a redirect rule applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceType: u8 {
        const MAIN_FRAME = 1 << 0;   // top-level document
        const SUB_FRAME = 1 << 1;    // iframe/frame

        const DOCUMENT = Self::MAIN_FRAME.bits() | Self::SUB_FRAME.bits();
    }
}

impl ResourceType {
    /// Browser names of the set bits, main frame first.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(2);
        if self.contains(Self::MAIN_FRAME) {
            names.push("main_frame");
        }
        if self.contains(Self::SUB_FRAME) {
            names.push("sub_frame");
        }
        names
    }
}

// =============================================================================
// Source Classification
// =============================================================================

/// What kind of watched host a source URL lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Regular page on one of the legacy site domains
    Page,
    /// Image asset subdomain (rewritten under `/pic/`)
    MediaImage,
    /// Video asset subdomain (rewritten under `/gif/`)
    MediaVideo,
}

// =============================================================================
// Redirect Decision
// =============================================================================

/// Why a source URL was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Redirection is switched off in settings
    Disabled,
    /// The configured target base failed validation
    InvalidTarget,
    /// The source URL could not be parsed
    UnparsableSource,
    /// The source host is not one of the watched hosts
    UnwatchedHost,
    /// Source and target share an origin (loop prevention)
    SameOrigin,
    /// The rewrite produced nothing usable
    RewriteFailed,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::InvalidTarget => "invalid-target",
            Self::UnparsableSource => "unparsable-source",
            Self::UnwatchedHost => "unwatched-host",
            Self::SameOrigin => "same-origin",
            Self::RewriteFailed => "rewrite-failed",
        }
    }
}

/// Final decision for a source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Navigate to this URL instead
    Redirect(Url),
    /// Let the navigation proceed untouched
    Skip(SkipReason),
}

impl RedirectDecision {
    /// The replacement URL, if any.
    pub fn redirect_url(&self) -> Option<&Url> {
        match self {
            Self::Redirect(url) => Some(url),
            Self::Skip(_) => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }
}

/// Response handed back to a navigation interceptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptResponse {
    /// Replacement URL, or `None` to allow the navigation
    pub redirect_to: Option<String>,
}

impl From<RedirectDecision> for InterceptResponse {
    fn from(decision: RedirectDecision) -> Self {
        Self {
            redirect_to: match decision {
                RedirectDecision::Redirect(url) => Some(url.into()),
                RedirectDecision::Skip(_) => None,
            },
        }
    }
}
