use std::collections::BTreeMap;
use std::fs;

use nr_core::policy::Redirector;
use nr_core::types::RedirectDecision;

pub struct ReplayOptions {
    pub input: String,
    pub limit: usize,
    pub verbose: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub total: usize,
    pub redirected: usize,
    pub skipped: BTreeMap<&'static str, usize>,
}

/// Navigation URLs from a file: JSONL objects with a `url` field, or one URL
/// per line.
pub fn load_navigations(path: &str, limit: usize) -> Result<Vec<String>, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(parse_navigations(&text, limit))
}

fn parse_navigations(text: &str, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.lines() {
        if out.len() >= limit {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with('{') {
            let value: serde_json::Value = match serde_json::from_str(trimmed) {
                Ok(val) => val,
                Err(_) => continue,
            };
            match value.get("url").and_then(|v| v.as_str()) {
                Some(url) if !url.is_empty() => out.push(url.to_string()),
                _ => continue,
            }
        } else {
            out.push(trimmed.to_string());
        }
    }
    out
}

pub fn replay(redirector: &Redirector, urls: &[String], verbose: bool) -> ReplayStats {
    let mut stats = ReplayStats::default();
    for url in urls {
        stats.total += 1;
        match redirector.evaluate(url) {
            RedirectDecision::Redirect(target) => {
                stats.redirected += 1;
                if verbose {
                    println!("  {} -> {}", url, target);
                }
            }
            RedirectDecision::Skip(reason) => {
                *stats.skipped.entry(reason.as_str()).or_default() += 1;
                if verbose {
                    println!("  {} (skip: {})", url, reason.as_str());
                }
            }
        }
    }
    stats
}

pub fn run_replay(redirector: &Redirector, opts: ReplayOptions) -> Result<(), String> {
    let urls = load_navigations(&opts.input, opts.limit)?;
    if urls.is_empty() {
        return Err(format!("Replay loaded 0 navigations from {}", opts.input));
    }

    let stats = replay(redirector, &urls, opts.verbose);

    println!("Replayed {} navigations from '{}'", stats.total, opts.input);
    println!("  Redirected:  {}", stats.redirected);
    for (reason, count) in &stats.skipped {
        println!("  Skipped:     {} ({})", count, reason);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_core::settings::Settings;

    #[test]
    fn test_parse_mixed_input() {
        let text = r#"
# comment
https://twitter.com/alice
{"url": "https://pbs.twimg.com/media/abc.jpg", "type": "image"}
{"type": "main_frame"}
{broken
https://example.com/
"#;
        let urls = parse_navigations(text, usize::MAX);
        assert_eq!(
            urls,
            vec![
                "https://twitter.com/alice",
                "https://pbs.twimg.com/media/abc.jpg",
                "https://example.com/",
            ]
        );
        assert_eq!(parse_navigations(text, 1).len(), 1);
    }

    #[test]
    fn test_replay_counts() {
        let urls: Vec<String> = [
            "https://twitter.com/alice",
            "https://x.com/bob/tweets",
            "https://xcancel.com/alice",
            "https://example.com/",
            "not a url",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let stats = replay(&Redirector::new(Settings::default()), &urls, false);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.redirected, 2);
        assert_eq!(stats.skipped.get("same-origin"), Some(&1));
        assert_eq!(stats.skipped.get("unwatched-host"), Some(&1));
        assert_eq!(stats.skipped.get("unparsable-source"), Some(&1));
    }
}
