//! Chapter number and volume parsing from entry names.

use std::sync::LazyLock;

use regex::Regex;

static VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])(?:volume|vol|v)\.?[\s_-]*(?P<volume>\d+)").expect("invalid regex")
});

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])(?:chapter|ch|c)\.?[\s_-]*(?P<number>\d+(?:\.\d+)?)")
        .expect("invalid regex")
});

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("invalid regex"));

/// Parses the chapter number of an entry name such as `Vol.2 Ch.10.5`,
/// `chapter-3` or `012`.
///
/// An explicit chapter marker wins; otherwise the first number outside the
/// volume marker is used.
#[must_use]
pub fn chapter_number(name: &str) -> Option<f64> {
    if let Some(caps) = CHAPTER_RE.captures(name) {
        return caps["number"].parse().ok();
    }

    let rest = VOLUME_RE.replace(name, " ");
    NUMBER_RE
        .find(&rest)
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses the volume label of an entry name such as `Vol.2 Ch.10.5`.
#[must_use]
pub fn volume_label(name: &str) -> Option<String> {
    VOLUME_RE.captures(name).map(|caps| {
        let digits = caps["volume"].trim_start_matches('0');
        if digits.is_empty() {
            "0".to_string()
        } else {
            digits.to_string()
        }
    })
}
