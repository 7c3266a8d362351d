//! Curated pattern detectors used by the chat trigger catalog (spec.md
//! §4.3): laugh phrases, kudos tags, mentions, and GIF URLs. Each is a
//! small, fixed regex set rather than NLP — the spec calls these out as
//! "curated" and "URL-pattern set", not general classification.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static LAUGH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(lol+|lmao+|lmfao+|rofl+|ha(ha)+|xd+)\b").expect("valid laugh regex")
});

static KUDOS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@?([A-Za-z0-9_]{2,32})\+\+").expect("valid kudos regex")
});

static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z0-9_]{2,32})").expect("valid mention regex")
});

static GIF_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(https?://\S+\.gif\b|https?://(www\.)?(giphy\.com|tenor\.com|media\.giphy\.com)/\S+)")
        .expect("valid gif url regex")
});

pub fn contains_laugh(text: &str) -> bool {
    LAUGH_RE.is_match(text)
}

/// Extracts kudos targets (`name++` / `@name++`), deduplicated, in the
/// order first seen.
pub fn kudos_targets(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for cap in KUDOS_RE.captures_iter(text) {
        let name = cap[1].to_string();
        let key = name.to_lowercase();
        if seen.insert(key) {
            out.push(name);
        }
    }
    out
}

/// Extracts `@mentions`, deduplicated, in order first seen.
pub fn mentions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for cap in MENTION_RE.captures_iter(text) {
        let name = cap[1].to_string();
        let key = name.to_lowercase();
        if seen.insert(key) {
            out.push(name);
        }
    }
    out
}

pub fn contains_gif_url(text: &str) -> bool {
    GIF_URL_RE.is_match(text)
}

/// Extracts channel-emote tokens from `text` given a caller-provided known
/// set (spec.md §4.3: "from a caller-provided set"). Tokens are whitespace
/// delimited; matching is exact and case-sensitive, matching typical emote
/// conventions (`:emote_name:` or bare `EmoteName` tokens supplied by KV).
pub fn extract_emotes<'a>(text: &'a str, known: &HashSet<String>) -> Vec<&'a str> {
    text.split_whitespace().filter(|tok| known.contains(*tok)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_laugh_variants() {
        assert!(contains_laugh("LOL that's great"));
        assert!(contains_laugh("hahaha no way"));
        assert!(!contains_laugh("a solo word"));
    }

    #[test]
    fn extracts_kudos_targets_deduplicated() {
        let targets = kudos_targets("nice work bob++ and bob++ again, @alice++");
        assert_eq!(targets, vec!["bob".to_string(), "alice".to_string()]);
    }

    #[test]
    fn detects_gif_urls() {
        assert!(contains_gif_url("check this out https://media.giphy.com/abc"));
        assert!(contains_gif_url("http://example.com/cat.gif"));
        assert!(!contains_gif_url("no link here"));
    }

    #[test]
    fn extracts_mentions() {
        assert_eq!(mentions("hey @bob and @alice"), vec!["bob".to_string(), "alice".to_string()]);
    }
}
