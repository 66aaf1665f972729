//! Source URL to instance URL rewriting
//!
//! Media assets are proxied through the instance's `/pic/` and `/gif/`
//! endpoints, profile tweet listings lose their `/tweets` segment, and every
//! other page keeps its path and query. Components are always assigned through
//! `Url` setters so that URL syntax characters stay escaped.

use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use url::Url;

use crate::instance::TargetBase;
use crate::source::{leading_label, IMAGE_LABEL, VIDEO_LABEL};

/// Characters left literal by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Instance endpoint proxying images.
pub const IMAGE_ENDPOINT: &str = "pic";
/// Instance endpoint proxying videos.
pub const VIDEO_ENDPOINT: &str = "gif";

static TWEETS_PATH: OnceLock<Regex> = OnceLock::new();

fn tweets_path_regex() -> &'static Regex {
    TWEETS_PATH.get_or_init(|| {
        Regex::new(r"^(/[^/]+)/tweets(/.*)?$").expect("tweets path pattern compiles")
    })
}

/// Percent-encode a full URL as a single path segment.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Drop the `/tweets` segment of a profile listing path, if that is what
/// `path` is.
pub fn strip_tweets_segment(path: &str) -> Option<String> {
    let caps = tweets_path_regex().captures(path)?;
    let profile = caps.get(1)?.as_str();
    let rest = caps.get(2).map_or("", |m| m.as_str());
    Some(format!("{}{}", profile, rest))
}

/// Rewrite `source` onto `target`.
///
/// Returns `None` when no sensible rewrite exists. The result always has the
/// target's origin.
pub fn rewrite(source: &Url, target: &TargetBase) -> Option<Url> {
    let host = source.host_str()?;
    let mut out = target.url().clone();

    match leading_label(host) {
        IMAGE_LABEL => set_media_path(&mut out, IMAGE_ENDPOINT, source),
        VIDEO_LABEL => set_media_path(&mut out, VIDEO_ENDPOINT, source),
        _ => {
            let path = source.path();
            match strip_tweets_segment(path) {
                Some(stripped) => out.set_path(&stripped),
                None => out.set_path(path),
            }
            out.set_query(source.query().filter(|q| !q.is_empty()));
        }
    }

    if out.origin() != target.origin() {
        log::warn!("rewrite of {} escaped {}; dropping", source, target);
        return None;
    }

    Some(out)
}

fn set_media_path(out: &mut Url, endpoint: &str, source: &Url) {
    let encoded = encode_component(source.as_str());
    out.set_path(&format!("/{}/{}", endpoint, encoded));
    out.set_query(None);
}

/// String form of [`rewrite`]: validates the target and parses the source,
/// returning `None` if either fails.
pub fn rewrite_url(source: &str, target: &str) -> Option<String> {
    let target = match TargetBase::parse(target) {
        Ok(target) => target,
        Err(e) => {
            log::debug!("{}", e);
            return None;
        }
    };
    let source = match Url::parse(source) {
        Ok(source) => source,
        Err(_) => {
            log::debug!("unparsable source URL '{}'", source);
            return None;
        }
    };
    rewrite(&source, &target).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::percent_decode_str;

    fn xcancel() -> TargetBase {
        TargetBase::parse("https://xcancel.com").unwrap()
    }

    fn rw(source: &str) -> Option<String> {
        rewrite_url(source, "https://xcancel.com")
    }

    #[test]
    fn test_tweets_listing_is_stripped() {
        assert_eq!(
            rw("https://twitter.com/alice/tweets?x=1").as_deref(),
            Some("https://xcancel.com/alice?x=1")
        );
        assert_eq!(
            rw("https://x.com/alice/tweets/with_replies").as_deref(),
            Some("https://xcancel.com/alice/with_replies")
        );
    }

    #[test]
    fn test_tweets_only_stripped_after_profile() {
        assert_eq!(
            rw("https://x.com/tweetsfan/tweets").as_deref(),
            Some("https://xcancel.com/tweetsfan")
        );
        assert_eq!(
            rw("https://x.com/alice/status/1/tweets").as_deref(),
            Some("https://xcancel.com/alice/status/1/tweets")
        );
        assert_eq!(rw("https://x.com/tweets").as_deref(), Some("https://xcancel.com/tweets"));
    }

    #[test]
    fn test_image_is_proxied() {
        assert_eq!(
            rw("https://pbs.twimg.com/media/abc.jpg").as_deref(),
            Some("https://xcancel.com/pic/https%3A%2F%2Fpbs.twimg.com%2Fmedia%2Fabc.jpg")
        );
    }

    #[test]
    fn test_video_is_proxied() {
        let out = rw("https://video.twimg.com/tweet_video/clip.mp4").unwrap();
        assert!(out.starts_with("https://xcancel.com/gif/https%3A%2F%2Fvideo.twimg.com%2F"));
    }

    #[test]
    fn test_media_segment_decodes_to_source() {
        let source =
            Url::parse("https://pbs.twimg.com/media/abc.jpg?format=jpg&name=small").unwrap();
        let out = rewrite(&source, &xcancel()).unwrap();
        assert_eq!(out.query(), None);

        let segment = out.path().strip_prefix("/pic/").unwrap();
        assert!(!segment.contains('/'));
        let decoded = percent_decode_str(segment).decode_utf8().unwrap();
        assert_eq!(decoded, source.as_str());
    }

    #[test]
    fn test_page_path_and_query_copied() {
        assert_eq!(
            rw("https://mobile.twitter.com/alice/status/123?s=20").as_deref(),
            Some("https://xcancel.com/alice/status/123?s=20")
        );
        assert_eq!(rw("https://x.com/").as_deref(), Some("https://xcancel.com/"));
        assert_eq!(rw("https://x.com/search?").as_deref(), Some("https://xcancel.com/search"));
    }

    #[test]
    fn test_fragment_is_dropped() {
        assert_eq!(rw("https://x.com/alice#top").as_deref(), Some("https://xcancel.com/alice"));
    }

    #[test]
    fn test_syntax_characters_stay_escaped() {
        let out = rw("https://x.com/a\"b<c>?q='x'").unwrap();
        for c in ['<', '>', '"', '\''] {
            assert!(!out.contains(c), "{} in {}", c, out);
        }
        assert!(out.starts_with("https://xcancel.com/"));
    }

    #[test]
    fn test_output_origin_is_target() {
        let target = TargetBase::parse("https://nitter.poast.org").unwrap();
        for source in [
            "https://twitter.com/alice",
            "https://pbs.twimg.com/media/abc.jpg",
            "https://x.com/alice/tweets",
            "https://x.com//evil.example/path",
        ] {
            let out = rewrite(&Url::parse(source).unwrap(), &target).unwrap();
            assert_eq!(out.origin(), target.origin(), "{}", source);
        }
    }

    #[test]
    fn test_invalid_inputs_yield_none() {
        assert_eq!(rewrite_url("https://twitter.com/alice", "http://xcancel.com"), None);
        assert_eq!(rewrite_url("https://twitter.com/alice", "https://evil.xcancel.com"), None);
        assert_eq!(rewrite_url("not a url", "https://xcancel.com"), None);
        assert_eq!(rewrite_url("mailto:alice@example.com", "https://xcancel.com"), None);
    }

    #[test]
    fn test_encode_component_matches_uri_component() {
        assert_eq!(encode_component("a b/c?d=e&f"), "a%20b%2Fc%3Fd%3De%26f");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }
}
