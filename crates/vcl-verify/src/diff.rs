//! Whitespace- and comment-insensitive text comparison.

use std::sync::LazyLock;

use regex::Regex;
use similar::TextDiff;

/// A `#` comment preceded by whitespace, through end of line.
static TRAILING_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+#.*$").unwrap_or_else(|e| panic!("trailing comment regex: {e}"))
});

/// Result of comparing remote text against a local copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextComparison {
    pub matches: bool,
    /// Unified diff of the raw texts, present only when they differ.
    pub diff: Option<String>,
}

/// Reduce a text to the lines that matter for comparison.
///
/// Trailing comments are cut, all whitespace is removed, and lines left
/// empty are dropped. A comment at column zero is kept, since nothing
/// precedes its marker.
pub fn normalize(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| TRAILING_COMMENT.replace(line, ""))
        .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|line| !line.is_empty())
        .collect()
}

/// True if the texts are equal once normalized.
pub fn equivalent(remote: &str, local: &str) -> bool {
    normalize(remote) == normalize(local)
}

/// Compare remote text against local text. `labels` name the two sides in
/// the unified diff header.
pub fn compare(remote: &str, local: &str, labels: (&str, &str)) -> TextComparison {
    if equivalent(remote, local) {
        return TextComparison {
            matches: true,
            diff: None,
        };
    }

    let diff = TextDiff::from_lines(remote, local)
        .unified_diff()
        .context_radius(3)
        .header(labels.0, labels.1)
        .to_string();

    TextComparison {
        matches: false,
        diff: Some(diff),
    }
}
