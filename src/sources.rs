//! Source-set resolution and module-kind inference.
//!
//! Glob patterns are always evaluated relative to an explicit base
//! directory and the matches are returned relative to it, so nothing here
//! depends on the process working directory.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{FsError, ResolutionError, Result};
use crate::naming::ModuleKind;
use crate::platform::Platform;

/// Source language of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Language {
    #[value(name = "c")]
    C,
    #[value(name = "c++")]
    Cxx,
    #[value(name = "objc")]
    ObjC,
    #[value(name = "objc++")]
    ObjCxx,
}

impl Language {
    /// Default search order: the first family with any match wins.
    pub const SEARCH_ORDER: [Self; 4] = [Self::Cxx, Self::C, Self::ObjC, Self::ObjCxx];

    /// Parse the keyword used on the command line and by `init`.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "c" => Some(Self::C),
            "c++" => Some(Self::Cxx),
            "objc" => Some(Self::ObjC),
            "objc++" => Some(Self::ObjCxx),
            _ => None,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cxx => "c++",
            Self::ObjC => "objc",
            Self::ObjCxx => "objc++",
        }
    }

    /// Glob patterns that find this language's sources.
    #[must_use]
    pub const fn patterns(self) -> &'static [&'static str] {
        match self {
            Self::Cxx => &["*.cpp", "*.cc", "*.cxx", "*.c++"],
            Self::C => &["*.c"],
            Self::ObjC => &["*.m"],
            Self::ObjCxx => &["*.mm"],
        }
    }

    /// Whether dcc compiles this language with the C++ compiler.
    #[must_use]
    pub const fn uses_cxx_compiler(self) -> bool {
        matches!(self, Self::Cxx | Self::ObjCxx)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Expands glob patterns inside one directory.
#[derive(Debug, Clone, Copy)]
pub struct SourceResolver<'a> {
    base: &'a Path,
    platform: &'a Platform,
}

impl<'a> SourceResolver<'a> {
    #[must_use]
    pub const fn new(base: &'a Path, platform: &'a Platform) -> Self {
        Self { base, platform }
    }

    /// The directory patterns are evaluated in.
    #[must_use]
    pub const fn base(&self) -> &'a Path {
        self.base
    }

    /// Expand every pattern and return the union of the matches, in pattern
    /// order, without duplicates. Names carrying another platform's infix are
    /// dropped. A pattern matching nothing is not an error here.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid or a directory cannot be read.
    pub fn expand<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for pattern in patterns {
            for path in self.glob(pattern.as_ref())? {
                if !found.contains(&path) {
                    found.push(path);
                }
            }
        }
        Ok(found)
    }

    /// Look for sources using the default per-language patterns.
    ///
    /// Languages are tried in [`Language::SEARCH_ORDER`] and the first one
    /// with any match wins. A `forced` language does not narrow the search,
    /// it only replaces the language reported for the files found.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be read.
    pub fn default_sources(
        &self,
        forced: Option<Language>,
    ) -> Result<Option<(Vec<PathBuf>, Language)>> {
        for lang in Language::SEARCH_ORDER {
            let files = self.expand(lang.patterns())?;
            if !files.is_empty() {
                tracing::debug!("found {} {lang} source(s)", files.len());
                return Ok(Some((files, forced.unwrap_or(lang))));
            }
        }
        Ok(None)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let escaped_base = glob::Pattern::escape(&self.base.to_string_lossy());
        let full = Path::new(&escaped_base).join(pattern);
        let entries = glob::glob(&full.to_string_lossy()).map_err(|source| ResolutionError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut matches = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                FsError::wrap("read directory", &path)(e.into())
            })?;
            let relative = path.strip_prefix(self.base).unwrap_or(&path).to_path_buf();
            if self.platform.is_other_platform_name(&relative.to_string_lossy()) {
                tracing::debug!("ignoring {}", relative.display());
                continue;
            }
            matches.push(relative);
        }
        Ok(matches)
    }
}

/// Decides whether a source file defines a program entry point.
#[cfg_attr(test, mockall::automock)]
pub trait MainDetector {
    /// Returns `true` if the file at `path` appears to define `main`.
    fn defines_main(&self, path: &Path) -> bool;
}

/// Line-oriented textual heuristic for C-family `main` definitions.
///
/// Matches an optional `int` (or `func`) return marker, `main`, optional
/// blanks and `(` followed by `void`, `int` or anything else. It is not a
/// parser: macro-wrapped or split signatures are missed, and a matching line
/// inside a comment counts.
#[derive(Debug, Clone)]
pub struct RegexMainDetector {
    pattern: Regex,
}

impl Default for RegexMainDetector {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            pattern: Regex::new(r"^[ \t]*(func|int)?[ \t]*main[ \t]*\((void|int|)")
                .expect("main-detection regex is valid"),
        }
    }
}

impl RegexMainDetector {
    /// Returns `true` if any line of `text` matches.
    #[must_use]
    pub fn matches_text(&self, text: &str) -> bool {
        text.lines().any(|line| self.pattern.is_match(line))
    }
}

impl MainDetector for RegexMainDetector {
    fn defines_main(&self, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(bytes) => self.matches_text(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                tracing::warn!("{}: {e}", path.display());
                false
            }
        }
    }
}

/// Infer the module kind from a resolved source set.
///
/// The first file defining `main` makes it an executable and stops the
/// scan. Otherwise the DLL flag, then the plugin flag, decide; the fallback
/// is a static library.
#[must_use]
pub fn infer_kind(
    base: &Path,
    sources: &[PathBuf],
    detector: &dyn MainDetector,
    dll_by_default: bool,
    plugin_by_default: bool,
) -> ModuleKind {
    let kind = if sources.iter().any(|src| detector.defines_main(&base.join(src))) {
        ModuleKind::Exe
    } else if dll_by_default {
        ModuleKind::Dll
    } else if plugin_by_default {
        ModuleKind::Plugin
    } else {
        ModuleKind::Lib
    };
    tracing::debug!("module type {kind}");
    kind
}
