//! Parser for the per-directory `.dmake` file.
//!
//! The file is a list of `KEY op VALUE` lines evaluated top to bottom, with
//! `OS` and `ARCH` predefined. Parsing stops at the first bad line.

use std::path::Path;

use super::vars::{Operator, Variable, Vars};
use crate::error::{FsError, ParseError, Result};
use crate::platform::Platform;

/// Variables defined before the first line of every `.dmake` file.
///
/// # Examples
///
/// ```
/// use dmake_cli::config::dmakefile::builtin_vars;
/// use dmake_cli::platform::{Os, Platform};
///
/// let vars = builtin_vars(&Platform::new(Os::Linux, "x86_64"));
/// assert_eq!(vars.value("OS"), Some("linux"));
/// assert_eq!(vars.value("ARCH"), Some("x86_64"));
/// ```
#[must_use]
pub fn builtin_vars(platform: &Platform) -> Vars {
    let mut vars = Vars::default();
    vars.set("OS", Variable::assign(platform.os.name()));
    vars.set("ARCH", Variable::assign(platform.arch.as_str()));
    vars
}

/// Parse a `.dmake` file.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains a malformed line.
pub fn parse_file(path: &Path, platform: &Platform) -> Result<Option<Vars>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FsError::wrap("read", path)(e).into()),
    };
    let vars = parse_str(&content, &path.display().to_string(), platform)?;
    Ok(Some(vars))
}

/// Parse `.dmake` content from a string.
///
/// Each line is blank, a `#` comment, a bare `KEY` (meaning `KEY = true`)
/// or `KEY op VALUE` with `op` one of `=`, `+=`, `-=`. Values are
/// interpolated against the variables defined so far.
///
/// ```
/// use dmake_cli::config::dmakefile::parse_str;
/// use dmake_cli::platform::{Os, Platform};
///
/// let platform = Platform::new(Os::Linux, "x86_64");
/// let vars = parse_str("NAME = fred\nEXE = ${NAME}_$OS\n", ".dmake", &platform).unwrap();
/// assert_eq!(vars.value("EXE"), Some("fred_linux"));
/// ```
///
/// # Errors
///
/// Stops at the first malformed line and reports it as `path:line - reason`.
pub fn parse_str(content: &str, path: &str, platform: &Platform) -> Result<Vars, ParseError> {
    let mut vars = builtin_vars(platform);

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fail = |reason: &str| ParseError {
            path: path.to_string(),
            line: line_num + 1,
            reason: reason.to_string(),
        };

        let (key, var) = match split_assignment(trimmed) {
            Some((key, op, value)) => {
                if key.is_empty() {
                    return Err(fail("malformed line, no variable name before '='"));
                }
                (key, Variable::new(op, vars.interpolate(value)))
            }
            None if trimmed.split_whitespace().count() == 1 => (trimmed, Variable::assign("true")),
            None => return Err(fail("malformed line, no '='")),
        };

        if key.split_whitespace().count() != 1 {
            return Err(fail("malformed line, spaces in key"));
        }
        vars.apply(key, var);
    }

    Ok(vars)
}

/// Split `KEY op VALUE` at the first `=`, folding a preceding `+` or `-`
/// into the operator. Key and value come back trimmed.
fn split_assignment(line: &str) -> Option<(&str, Operator, &str)> {
    let eq = line.find('=')?;
    let (lhs, rhs) = line.split_at(eq);
    let value = rhs.get(1..).unwrap_or_default().trim();
    let key_end = if lhs.ends_with(['+', '-']) {
        eq.saturating_sub(1)
    } else {
        eq
    };
    let op = Operator::from_token(line.get(key_end..=eq)?)?;
    Some((line.get(..key_end)?.trim(), op, value))
}
