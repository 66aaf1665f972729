//! Watched Twitter/X hostnames
//!
//! Only requests to these hosts are ever considered for redirection.

use crate::types::SourceKind;

/// Page hosts of the two legacy domains (root, `www` and `mobile`).
pub const REDIRECT_DOMAINS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "x.com",
    "www.x.com",
    "mobile.twitter.com",
    "mobile.x.com",
];

/// Media asset hosts.
pub const MEDIA_DOMAINS: &[&str] = &["pbs.twimg.com", "video.twimg.com"];

/// Leading label marking the image asset subdomain.
pub const IMAGE_LABEL: &str = "pbs";
/// Leading label marking the video asset subdomain.
pub const VIDEO_LABEL: &str = "video";

/// Service worker scopes the legacy site registers.
pub const SERVICE_WORKER_SCOPES: &[&str] = &["https://twitter.com/", "https://x.com/"];

/// Every host an interceptor should watch.
pub fn watched_hosts() -> impl Iterator<Item = &'static str> {
    REDIRECT_DOMAINS.iter().chain(MEDIA_DOMAINS.iter()).copied()
}

/// Leading DNS label of a hostname.
#[inline]
pub fn leading_label(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

/// Classify a hostname, or `None` if it is not watched.
pub fn classify_host(host: &str) -> Option<SourceKind> {
    let host = host.trim_end_matches('.');
    if MEDIA_DOMAINS.iter().any(|d| d.eq_ignore_ascii_case(host)) {
        return match leading_label(host).to_ascii_lowercase().as_str() {
            IMAGE_LABEL => Some(SourceKind::MediaImage),
            VIDEO_LABEL => Some(SourceKind::MediaVideo),
            _ => None,
        };
    }
    if REDIRECT_DOMAINS.iter().any(|d| d.eq_ignore_ascii_case(host)) {
        return Some(SourceKind::Page);
    }
    None
}
