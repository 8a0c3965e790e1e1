//! Command: scaffold a new project directory.
//!
//! Writes the dcc option files under `.dcc/`, an optional `.dmake` naming
//! the output, and a wrapper `Makefile`. Nothing is written if any of those
//! already exist, and everything written is removed again if a later step
//! fails.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::CommandSetup;
use crate::config::{DMAKEFILE, Settings};
use crate::descriptor::default_output_name;
use crate::error::{self, ConflictError, FsError};
use crate::logging::Logger;
use crate::naming::ModuleKind;
use crate::platform::Platform;
use crate::sources::{Language, MainDetector, RegexMainDetector, SourceResolver, infer_kind};

const DCC_DIR: &str = ".dcc";
const MAKEFILE: &str = "Makefile";
const READ_BY_DCC: &str = "# This file is read by dcc\n\n";
const WARNING_OPTIONS: &str = "-Wall -Wextra -pedantic";
const C_STANDARDS: [&str; 2] = ["c99", "c11"];
const CXX_STANDARDS: [&str; 4] = ["c++11", "c++14", "c++17", "c++20"];
const DEFAULT_C_STANDARD: &str = "c11";
const DEFAULT_CXX_STANDARD: &str = "c++14";

/// Optimisation profile written to the compiler options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "debug" => Some(Self::Debug),
            "release" => Some(Self::Release),
            _ => None,
        }
    }

    const fn options(self) -> &'static str {
        match self {
            Self::Debug => "-DDEBUG\n-O0\n",
            Self::Release => "-DNDEBUG\n-O2\n",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Release => "release",
        })
    }
}

/// Choices made by the init keywords, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitOptions {
    pub kind: Option<ModuleKind>,
    pub language: Option<Language>,
    pub standard: Option<String>,
    pub mode: Option<BuildMode>,
    pub output: Option<String>,
}

impl InitOptions {
    /// Classify the init keywords.
    ///
    /// `detected` is the language of the sources already present, if any;
    /// a language keyword must agree with it. `output` is a name given with
    /// `-o`, which a bare name among the keywords may not repeat.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError::AlreadySpecified`] when a category is given
    /// twice and [`ConflictError::Incompatible`] when a keyword contradicts
    /// the sources or the language.
    pub fn parse(
        keywords: &[String],
        detected: Option<Language>,
        output: Option<&str>,
    ) -> Result<Self, ConflictError> {
        let mut opts = Self {
            language: detected,
            output: output.map(String::from),
            ..Self::default()
        };

        for arg in keywords {
            let arg = arg.as_str();
            if let Some(lang) = Language::from_keyword(arg) {
                match (detected, opts.language) {
                    (Some(found), _) if found != lang => {
                        return Err(ConflictError::Incompatible {
                            arg: arg.to_string(),
                            reason: format!("not the language used by source files, {found}"),
                        });
                    }
                    (None, Some(existing)) => {
                        return Err(already(arg, "language", existing));
                    }
                    _ => opts.language = Some(lang),
                }
            } else if let Some(kind) = ModuleKind::from_keyword(arg) {
                set_once(&mut opts.kind, kind, arg, "project type")?;
            } else if let Some(mode) = BuildMode::from_keyword(arg) {
                set_once(&mut opts.mode, mode, arg, "build mode")?;
            } else if C_STANDARDS.contains(&arg) {
                if opts.language.is_some_and(Language::uses_cxx_compiler) {
                    return Err(incompatible(arg, "C standard specified but this is a C++ project"));
                }
                set_once(&mut opts.standard, arg.to_string(), arg, "language standard")?;
            } else if CXX_STANDARDS.contains(&arg) {
                if opts.language.is_some_and(|l| !l.uses_cxx_compiler()) {
                    return Err(incompatible(arg, "C++ standard specified but this is a C project"));
                }
                set_once(&mut opts.standard, arg.to_string(), arg, "language standard")?;
            } else {
                set_once(&mut opts.output, arg.to_string(), arg, "output filename")?;
            }
        }

        // A language keyword may follow the standard it contradicts.
        if let (Some(std), Some(lang)) = (opts.standard.as_deref(), opts.language) {
            let cxx_standard = CXX_STANDARDS.contains(&std);
            if cxx_standard && !lang.uses_cxx_compiler() {
                return Err(incompatible(std, "C++ standard specified but this is a C project"));
            }
            if !cxx_standard && lang.uses_cxx_compiler() {
                return Err(incompatible(std, "C standard specified but this is a C++ project"));
            }
        }
        Ok(opts)
    }

    /// The language, falling back to what the standard implies.
    #[must_use]
    pub fn effective_language(&self) -> Option<Language> {
        self.language.or_else(|| {
            self.standard.as_deref().map(|std| {
                if CXX_STANDARDS.contains(&std) {
                    Language::Cxx
                } else {
                    Language::C
                }
            })
        })
    }

    /// The `-std=` value, defaulting by language.
    #[must_use]
    pub fn effective_standard(&self) -> Option<String> {
        self.standard.clone().or_else(|| {
            self.effective_language().map(|lang| {
                if lang.uses_cxx_compiler() {
                    DEFAULT_CXX_STANDARD.to_string()
                } else {
                    DEFAULT_C_STANDARD.to_string()
                }
            })
        })
    }
}

fn already(arg: &str, what: &'static str, value: impl fmt::Display) -> ConflictError {
    ConflictError::AlreadySpecified {
        arg: arg.to_string(),
        what,
        value: value.to_string(),
    }
}

fn incompatible(arg: &str, reason: &str) -> ConflictError {
    ConflictError::Incompatible {
        arg: arg.to_string(),
        reason: reason.to_string(),
    }
}

fn set_once<T: fmt::Display>(
    slot: &mut Option<T>,
    value: T,
    arg: &str,
    what: &'static str,
) -> Result<(), ConflictError> {
    if let Some(existing) = slot {
        return Err(already(arg, what, existing));
    }
    *slot = Some(value);
    Ok(())
}

/// Contents of the compiler options file.
#[must_use]
pub fn compiler_options(standard: Option<&str>, mode: BuildMode) -> String {
    let mut text = String::from(READ_BY_DCC);
    if let Some(std) = standard {
        text.push_str(&format!("-std={std}\n"));
    }
    text.push_str(WARNING_OPTIONS);
    text.push_str("\n-g\n");
    text.push_str(mode.options());
    text
}

/// Contents of the wrapper makefile.
#[must_use]
pub fn makefile() -> String {
    [
        ".PHONY: all clean install",
        "prefix?=/usr/local",
        "quiet?=@",
        "sudo?=",
        "all:; $(quiet) dmake",
        "clean:; $(quiet) dmake clean",
        "install: all; $(quiet) $(sudo) dmake --prefix=$(prefix) install",
        "",
    ]
    .join("\n")
}

/// What an init run writes.
#[derive(Debug)]
struct Plan {
    options_file: String,
    options: String,
    kind: ModuleKind,
    dmake: Option<String>,
}

/// Files created so far, removed again on failure.
#[derive(Debug)]
struct Scaffold<'a> {
    base: &'a Path,
    created: Vec<PathBuf>,
    created_dir: Option<PathBuf>,
}

impl<'a> Scaffold<'a> {
    const fn new(base: &'a Path) -> Self {
        Self {
            base,
            created: Vec::new(),
            created_dir: None,
        }
    }

    fn mkdir(&mut self, name: &str) -> error::Result<()> {
        let dir = self.base.join(name);
        fs::create_dir(&dir).map_err(FsError::wrap("create directory", &dir))?;
        self.created_dir = Some(dir);
        Ok(())
    }

    fn write(&mut self, name: &str, content: &str) -> error::Result<()> {
        let path = self.base.join(name);
        if let Err(e) = fs::write(&path, content) {
            let _ = fs::remove_file(&path);
            return Err(FsError::wrap("write", &path)(e).into());
        }
        tracing::debug!("created {name}");
        self.created.push(PathBuf::from(name));
        Ok(())
    }

    fn generate(&mut self, plan: &Plan) -> error::Result<()> {
        self.mkdir(DCC_DIR)?;
        self.write(&plan.options_file, &plan.options)?;
        if plan.kind != ModuleKind::Lib {
            self.write(&format!("{DCC_DIR}/LDFLAGS"), READ_BY_DCC)?;
        }
        if plan.kind == ModuleKind::Exe {
            self.write(&format!("{DCC_DIR}/LIBS"), READ_BY_DCC)?;
        }
        if let Some(dmake) = &plan.dmake {
            self.write(DMAKEFILE, dmake)?;
        }
        self.write(MAKEFILE, &makefile())
    }

    fn rollback(&self) {
        for name in self.created.iter().rev() {
            let _ = fs::remove_file(self.base.join(name));
        }
        if let Some(dir) = &self.created_dir {
            let _ = fs::remove_dir(dir);
        }
    }
}

/// Refuse to run over an existing project.
fn guard(base: &Path) -> Result<(), ConflictError> {
    for (name, what) in [
        (DCC_DIR, ".dcc directory"),
        (DMAKEFILE, ".dmake file"),
        (MAKEFILE, "Makefile"),
    ] {
        if base.join(name).symlink_metadata().is_ok() {
            return Err(ConflictError::AlreadyExists { what });
        }
    }
    Ok(())
}

/// Scaffold the project in `base` and return the files created, relative
/// to `base`.
///
/// # Errors
///
/// Returns an error if an artifact already exists, the keywords conflict,
/// or a file cannot be written. Files written before the failure are
/// removed.
pub fn init_project(
    base: &Path,
    platform: &Platform,
    settings: &Settings,
    detector: &dyn MainDetector,
    output: Option<&str>,
    keywords: &[String],
) -> error::Result<Vec<PathBuf>> {
    guard(base)?;

    let resolver = SourceResolver::new(base, platform);
    let (sources, detected) = match resolver.default_sources(settings.language)? {
        Some((files, lang)) => (files, Some(lang)),
        None => (Vec::new(), settings.language),
    };
    let opts = InitOptions::parse(keywords, detected, output)?;

    let kind = opts.kind.unwrap_or_else(|| {
        infer_kind(
            base,
            &sources,
            detector,
            settings.dll_by_default,
            settings.plugin_by_default,
        )
    });
    let default_name = default_output_name(base);
    let name = opts.output.clone().unwrap_or_else(|| default_name.clone());
    let options_file = if opts.effective_language().is_some_and(Language::uses_cxx_compiler) {
        "CXXFLAGS"
    } else {
        "CFLAGS"
    };
    let standard = opts.effective_standard();

    let plan = Plan {
        options_file: format!("{DCC_DIR}/{options_file}"),
        options: compiler_options(standard.as_deref(), opts.mode.unwrap_or_default()),
        kind,
        dmake: (name != default_name).then(|| format!("{} = {name}\n", kind.config_key())),
    };

    let mut scaffold = Scaffold::new(base);
    let result = scaffold.generate(&plan);
    match result {
        Ok(()) => Ok(scaffold.created),
        Err(e) => {
            scaffold.rollback();
            Err(e)
        }
    }
}

/// Run `dmake init` in the setup's base directory.
///
/// # Errors
///
/// Returns an error if the project cannot be scaffolded.
pub fn run(
    setup: &CommandSetup,
    output: Option<&str>,
    keywords: &[String],
    log: &Logger,
) -> Result<()> {
    log.stage(&format!("initialising {}", setup.base.display()));
    let created = init_project(
        &setup.base,
        &setup.platform,
        &setup.settings,
        &RegexMainDetector::default(),
        output,
        keywords,
    )
    .with_context(|| format!("running init in {}", setup.base.display()))?;
    for path in created {
        log.info(&format!("created {}", path.display()));
    }
    Ok(())
}
