//! Per-directory build state.

use std::path::{Path, PathBuf};

use crate::config::source_list;
use crate::config::{Vars, keys};
use crate::error::{ConflictError, ResolutionError, Result};
use crate::naming::{ModuleKind, NamingProfile};
use crate::sources::SourceResolver;

/// Kind keys in the order they are applied.
const KIND_KEYS: [ModuleKind; 4] = [
    ModuleKind::Dll,
    ModuleKind::Plugin,
    ModuleKind::Exe,
    ModuleKind::Lib,
];

/// Everything decided about the module built in one directory.
///
/// A fresh descriptor is created for every directory visited; nothing is
/// shared between levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    /// Source files, relative to the directory.
    pub sources: Vec<PathBuf>,
    /// Module kind, `None` until declared or inferred.
    pub kind: Option<ModuleKind>,
    /// Output file, relative to the directory.
    pub output_name: String,
    /// `true` while `output_name` is still the directory-derived default.
    pub output_name_is_default: bool,
    /// The directory-derived default output stem.
    pub default_name: String,
    /// Installation prefix from the command line or `.dmake`.
    pub install_prefix: Option<String>,
    /// Sub-directories to visit, relative to the directory.
    pub subdirectories: Vec<PathBuf>,
}

impl BuildDescriptor {
    /// Create the descriptor for the directory `dir`.
    ///
    /// With no `output_name` the name defaults to the directory's base name,
    /// or its parent's when the directory is called `src` or `source`.
    #[must_use]
    pub fn new(dir: &Path, output_name: Option<&str>, install_prefix: Option<String>) -> Self {
        let default_name = default_output_name(dir);
        let (output_name, output_name_is_default) = match output_name {
            Some(name) => (name.to_string(), false),
            None => (default_name.clone(), true),
        };
        Self {
            sources: Vec::new(),
            kind: None,
            output_name,
            output_name_is_default,
            default_name,
            install_prefix,
            subdirectories: Vec::new(),
        }
    }

    /// Declare the module kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError::ModuleKind`] if a different kind is already
    /// in force.
    pub fn set_kind(&mut self, kind: ModuleKind, key: &str) -> Result<(), ConflictError> {
        match self.kind {
            Some(existing) if existing != kind => Err(ConflictError::ModuleKind {
                key: key.to_string(),
                existing: existing.to_string(),
            }),
            _ => {
                self.kind = Some(kind);
                Ok(())
            }
        }
    }

    /// Give the output its platform name now that the kind is known.
    ///
    /// Only a directory-derived default is renamed; names the user supplied
    /// are left as they are.
    pub fn synthesize_name(&mut self, naming: &NamingProfile) {
        if let Some(kind) = self.kind
            && self.output_name_is_default
        {
            self.output_name = naming.name_for(kind, &self.output_name);
        }
    }

    /// Merge the variables read from a `.dmake` file.
    ///
    /// Recognised keys are `SRCS`, `SRCSFILE`, `PREFIX`, `DIRS` and the kind
    /// keys `DLL`, `PLUGIN`, `EXE`, `LIB` (applied in that order). A kind key
    /// names the output and replaces any name given on the command line.
    /// `PREFIX` and `DIRS` only apply when the command line gave none.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern list matches nothing, a source-list file
    /// cannot be read, or a kind key conflicts with the kind already in force.
    pub fn apply_vars(
        &mut self,
        vars: &Vars,
        resolver: &SourceResolver<'_>,
        naming: &NamingProfile,
    ) -> Result<()> {
        if let Some(patterns) = vars.value(keys::SRCS) {
            let words: Vec<&str> = patterns.split_whitespace().collect();
            self.sources = resolver.expand(&words)?;
            if self.sources.is_empty() {
                return Err(ResolutionError::NoMatchingSources {
                    key: keys::SRCS.to_string(),
                    patterns: patterns.to_string(),
                }
                .into());
            }
        }

        if let Some(file) = vars.value(keys::SRCSFILE) {
            let patterns = source_list::parse_file(&resolver.base().join(file))?;
            for path in resolver.expand(&patterns)? {
                if !self.sources.contains(&path) {
                    self.sources.push(path);
                }
            }
            if self.sources.is_empty() {
                return Err(ResolutionError::NoMatchingSources {
                    key: keys::SRCSFILE.to_string(),
                    patterns: file.to_string(),
                }
                .into());
            }
        }

        if let Some(prefix) = vars.value(keys::PREFIX)
            && self.install_prefix.is_none()
        {
            self.install_prefix = Some(prefix.to_string());
        }

        if let Some(patterns) = vars.value(keys::DIRS) {
            let words: Vec<&str> = patterns.split_whitespace().collect();
            let dirs = resolver.expand(&words)?;
            if dirs.is_empty() {
                return Err(ResolutionError::NoMatchingDirectories {
                    patterns: patterns.to_string(),
                }
                .into());
            }
            if self.subdirectories.is_empty() {
                self.subdirectories = dirs;
            }
        }

        for kind in KIND_KEYS {
            let key = kind.config_key();
            if let Some(name) = vars.value(key) {
                self.set_kind(kind, key)?;
                self.output_name = naming.name_for(kind, name);
                self.output_name_is_default = false;
            }
        }

        Ok(())
    }

    #[must_use]
    pub const fn has_subdirectories(&self) -> bool {
        !self.subdirectories.is_empty()
    }
}

/// Default output stem for `dir`.
///
/// The directory is canonicalized first so `.` and trailing separators
/// resolve to a real name.
#[must_use]
pub fn default_output_name(dir: &Path) -> String {
    let dir = dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    let base_name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let name = base_name(&dir);
    if is_common_source_dir(&name)
        && let Some(parent) = dir.parent()
    {
        return base_name(parent);
    }
    name
}

fn is_common_source_dir(name: &str) -> bool {
    name.eq_ignore_ascii_case("src") || name.eq_ignore_ascii_case("source")
}
