//! Source-list files named by `SRCSFILE`.

use std::path::Path;

use crate::error::{FsError, Result};

/// Read a source-list file: every non-blank, non-comment line holds one or
/// more whitespace-separated glob patterns. All patterns are returned in
/// file order.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn parse_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(FsError::wrap("read", path))?;
    Ok(parse_str(&content))
}

/// Parse source-list content from a string.
///
/// ```
/// use dmake_cli::config::source_list::parse_str;
///
/// let patterns = parse_str("# sources\nmain.c util.c\n\nlib/*.c\n");
/// assert_eq!(patterns, ["main.c", "util.c", "lib/*.c"]);
/// ```
#[must_use]
pub fn parse_str(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_skipped() {
        assert!(parse_str("# nothing\n\n   \n").is_empty());
    }

    #[test]
    fn patterns_are_unioned_across_lines() {
        let patterns = parse_str("a.c\n  b.c c.c  \n");
        assert_eq!(patterns, ["a.c", "b.c", "c.c"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = parse_file(&tmp.path().join("SOURCES")).unwrap_err();
        assert!(err.to_string().starts_with("read "));
    }
}
