//! Raw line metrics, independent of the syntax tree.

/// Line-based counts for one source file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawMetrics {
    /// Non-blank lines that are not full-line comments.
    pub effective_loc: usize,
    /// Full-line `#` comments.
    pub comment_loc: usize,
}

/// Classifies every line of `source` as blank, comment, or code.
///
/// Intentionally string-based: this runs even for files the parser
/// rejects, so the report still carries line counts for them.
#[must_use]
pub fn analyze_raw(source: &str) -> RawMetrics {
    let mut metrics = RawMetrics::default();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            metrics.comment_loc += 1;
        } else {
            metrics.effective_loc += 1;
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_code_and_comments() {
        let source = "# header\n\nx = 1\n  # indented comment\ny = 2  # trailing\n";
        let m = analyze_raw(source);
        assert_eq!(m.comment_loc, 2);
        assert_eq!(m.effective_loc, 2);
    }

    #[test]
    fn empty_source_is_zero() {
        assert_eq!(analyze_raw(""), RawMetrics::default());
    }
}
