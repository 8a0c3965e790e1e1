//! Platform-specific output file names.
//!
//! All functions here are pure: they take a [`NamingProfile`] and a path and
//! return a new path. Prefixes and suffixes are only added when missing, so
//! naming is idempotent.

use std::fmt;
use std::path::{Path, PathBuf};

/// The kind of module a directory builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// An executable program.
    Exe,
    /// A static library.
    Lib,
    /// A dynamic (shared) library.
    Dll,
    /// A dynamically loaded plugin.
    Plugin,
}

impl ModuleKind {
    /// Parse one of the positional keywords `exe`, `lib`, `dll`, `plugin`.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "exe" => Some(Self::Exe),
            "lib" => Some(Self::Lib),
            "dll" => Some(Self::Dll),
            "plugin" => Some(Self::Plugin),
            _ => None,
        }
    }

    /// The option telling dcc what to produce.
    #[must_use]
    pub const fn driver_flag(self) -> &'static str {
        match self {
            Self::Exe => "--exe",
            Self::Lib => "--lib",
            Self::Dll => "--dll",
            Self::Plugin => "--plugin",
        }
    }

    /// The `.dmake` key that declares this kind.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Exe => "EXE",
            Self::Lib => "LIB",
            Self::Dll => "DLL",
            Self::Plugin => "PLUGIN",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exe => "exe",
            Self::Lib => "lib",
            Self::Dll => "dll",
            Self::Plugin => "plugin",
        })
    }
}

/// File name prefixes and suffixes for one family of platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingProfile {
    /// Object file suffix.
    pub obj_suffix: &'static str,
    /// Executable suffix, empty outside Windows.
    pub exe_suffix: &'static str,
    /// Static library prefix.
    pub lib_prefix: &'static str,
    /// Static library suffix.
    pub lib_suffix: &'static str,
    /// Dynamic library prefix. Plugins never get one.
    pub dll_prefix: &'static str,
    /// Dynamic library suffix, shared with plugins.
    pub dll_suffix: &'static str,
}

impl NamingProfile {
    /// `foo.exe`, `foo.lib`, `foo.dll`.
    pub const WINDOWS: Self = Self {
        obj_suffix: ".obj",
        exe_suffix: ".exe",
        lib_prefix: "",
        lib_suffix: ".lib",
        dll_prefix: "",
        dll_suffix: ".dll",
    };

    /// macOS and iOS: `libfoo.dylib`.
    pub const DARWIN: Self = Self {
        obj_suffix: ".o",
        exe_suffix: "",
        lib_prefix: "lib",
        lib_suffix: ".a",
        dll_prefix: "lib",
        dll_suffix: ".dylib",
    };

    /// Every other Unix.
    pub const ELF: Self = Self {
        obj_suffix: ".o",
        exe_suffix: "",
        lib_prefix: "lib",
        lib_suffix: ".a",
        dll_prefix: "lib",
        dll_suffix: ".so",
    };

    /// Synthesize the output file name for a module of `kind` from `stem`.
    ///
    /// Any directory part of `stem` is kept; the prefix and suffix apply to
    /// the final component only.
    ///
    /// ```
    /// use dmake_cli::naming::{ModuleKind, NamingProfile};
    ///
    /// let elf = NamingProfile::ELF;
    /// assert_eq!(elf.name_for(ModuleKind::Lib, "fred"), "libfred.a");
    /// assert_eq!(elf.name_for(ModuleKind::Lib, "libfred.a"), "libfred.a");
    /// assert_eq!(elf.name_for(ModuleKind::Dll, "out/fred"), "out/libfred.so");
    /// ```
    #[must_use]
    pub fn name_for(&self, kind: ModuleKind, stem: &str) -> String {
        match kind {
            ModuleKind::Exe => form_filename("", stem, self.exe_suffix),
            ModuleKind::Lib => form_filename(self.lib_prefix, stem, self.lib_suffix),
            ModuleKind::Dll => form_filename(self.dll_prefix, stem, self.dll_suffix),
            ModuleKind::Plugin => form_filename("", stem, self.dll_suffix),
        }
    }

    /// Object file for `source`, placed in the `objs_dir` sub-directory next
    /// to the source.
    #[must_use]
    pub fn object_filename(&self, source: &Path, objs_dir: &str) -> PathBuf {
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let stem = source
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        let path = clean_join(&clean_join(dir, Path::new(objs_dir)), Path::new(&stem));
        PathBuf::from(form_filename("", &path.to_string_lossy(), self.obj_suffix))
    }
}

/// Dependency file dcc writes for `object`.
///
/// When the object already lives in the `objs_dir` sub-directory the
/// dependency file shares its location, otherwise it goes in a `deps_dir`
/// sub-directory next to the object.
#[must_use]
pub fn dependencies_filename(object: &Path, objs_dir: &str, deps_dir: &str) -> PathBuf {
    let dir = object.parent().unwrap_or_else(|| Path::new(""));
    let base = object.file_name().map(PathBuf::from).unwrap_or_default();
    if dir.to_string_lossy().ends_with(objs_dir) {
        dir.join(base)
    } else {
        dir.join(deps_dir).join(base)
    }
}

fn form_filename(prefix: &str, path: &str, suffix: &str) -> String {
    let path = Path::new(path);
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut base = path
        .file_name()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    if !prefix.is_empty() && !base.starts_with(prefix) {
        base.insert_str(0, prefix);
    }
    if !suffix.is_empty() && !base.ends_with(suffix) {
        base.push_str(suffix);
    }
    clean_join(dir, Path::new(&base))
        .to_string_lossy()
        .into_owned()
}

/// Join two paths and drop `.` components, so `./x` and `x` name the same
/// file.
fn clean_join(dir: &Path, name: &Path) -> PathBuf {
    dir.join(name)
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
