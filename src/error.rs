//! Domain-specific error types for the build orchestrator.
//!
//! Core modules (configuration parsing, source resolution, the orchestrator
//! and the directory walker) return [`DmakeError`] so that a keep-going walk
//! can hold on to the first failure verbatim. Command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DmakeError
//! ├── Parse(ParseError)           malformed .dmake / source-list lines
//! ├── Conflict(ConflictError)     module kind or init keyword given twice
//! ├── Resolution(ResolutionError) no sources, empty glob expansions
//! ├── Delegate(DelegateError)     dcc / install failures
//! ├── Fs(FsError)                 filesystem operations, wrapped with path
//! └── Usage(UsageError)           bad positional arguments
//! ```

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the core modules.
pub type Result<T, E = DmakeError> = std::result::Result<T, E>;

/// Top-level error type for dmake.
#[derive(Error, Debug)]
pub enum DmakeError {
    /// A configuration or source-list file could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Two definitions of the same thing disagree.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// Nothing to build could be found.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// An external process failed.
    #[error(transparent)]
    Delegate(#[from] DelegateError),

    /// A filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The command line could not be interpreted.
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// A malformed line in a line-oriented input file.
///
/// Displayed as `path:line - reason`, line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}:{line} - {reason}")]
pub struct ParseError {
    /// File being parsed.
    pub path: String,
    /// 1-based line number.
    pub line: usize,
    /// What is wrong with the line.
    pub reason: String,
}

/// Conflicting definitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// A `.dmake` kind key disagrees with an already established kind.
    #[error("{key} definition conflicts with {existing}")]
    ModuleKind {
        /// The configuration key, e.g. `EXE`.
        key: String,
        /// The kind already in force.
        existing: String,
    },

    /// An init keyword category was supplied twice.
    #[error("{arg}: {what} already specified as {value}")]
    AlreadySpecified {
        /// The offending argument.
        arg: String,
        /// Keyword category, e.g. `project type`.
        what: &'static str,
        /// The earlier value.
        value: String,
    },

    /// An init keyword disagrees with what the sources say.
    #[error("{arg}: {reason}")]
    Incompatible {
        /// The offending argument.
        arg: String,
        /// Why it cannot be used.
        reason: String,
    },

    /// Init found an artifact it would otherwise create.
    #[error("a {what} already exists, not continuing")]
    AlreadyExists {
        /// The artifact, e.g. `Makefile`.
        what: &'static str,
    },
}

/// Nothing (or not enough) was found to act upon.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// No source files were found in a directory.
    #[error("no C, Objective-C++, Objective-C or C++ source files found in {}", .dir.display())]
    NoSources {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// An explicit source pattern list matched nothing.
    #[error("{key}={patterns} matches no source files")]
    NoMatchingSources {
        /// Configuration key holding the patterns.
        key: String,
        /// The patterns as written.
        patterns: String,
    },

    /// A `DIRS` pattern list matched nothing.
    #[error("DIRS={patterns} matches no names")]
    NoMatchingDirectories {
        /// The patterns as written.
        patterns: String,
    },

    /// A glob pattern is syntactically invalid.
    #[error("invalid pattern {pattern:?}: {source}")]
    BadPattern {
        /// The pattern as written.
        pattern: String,
        /// Underlying pattern error.
        source: glob::PatternError,
    },
}

/// Failure of an external collaborator process.
#[derive(Error, Debug)]
pub enum DelegateError {
    /// The process could not be started.
    #[error("failed to execute {program}: {source}")]
    Launch {
        /// Program name or path.
        program: String,
        /// Underlying spawn error.
        source: io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("{program} failed (exit {})", exit_label(.code))]
    Failed {
        /// Program name or path.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
    },
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// A filesystem operation failed, carrying the operation and path.
#[derive(Error, Debug)]
#[error("{op} {}: {source}", .path.display())]
pub struct FsError {
    /// Short operation description, e.g. `create directory`.
    pub op: &'static str,
    /// Path the operation was applied to.
    pub path: PathBuf,
    /// Underlying I/O error.
    pub source: io::Error,
}

impl FsError {
    /// Build a closure suitable for `map_err` that wraps an [`io::Error`].
    #[must_use]
    pub fn wrap(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self { op, path, source }
    }
}

/// Bad positional arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("usage: {0}")]
pub struct UsageError(pub String);
