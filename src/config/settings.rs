//! Settings shared by every directory of one run.
//!
//! Built once from the command line and the environment, then only read.

use std::path::PathBuf;

use crate::sources::Language;

/// Objects sub-directory used when `OBJDIR` is unset.
pub const DEFAULT_OBJECTS_DIR: &str = ".objs";

/// Dependency sub-directory used when `DCCDEPS` is unset.
pub const DEFAULT_DEPS_DIR: &str = ".dcc.d";

/// The compiler driver every build is delegated to.
pub const DRIVER: &str = "dcc";

/// Environment variables passed through to the compiler driver.
pub const DELEGATE_ENV_ALLOW_LIST: [&str; 16] = [
    // Standard/common names
    "HOME",
    "LOGNAME",
    "PATH",
    "SHELL",
    "TERM",
    "TERMCAP",
    "USER",
    // dcc recognised
    "CC",
    "CXX",
    "NJOBS",
    "CCFILE",
    "CXXFILE",
    "CFLAGSFILE",
    "CXXFLAGSFILE",
    "LDFLAGSFILE",
    "LIBSFILE",
];

/// Process-wide settings, assembled once from the command line and
/// environment and passed by reference to every directory run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Name of the object-file sub-directory.
    pub objects_dir: String,
    /// Name of the dependency-file sub-directory.
    pub deps_dir: String,
    /// Installation prefix from the command line, if any.
    pub install_prefix: Option<String>,
    /// Continue with sibling directories after a failure.
    pub keep_going: bool,
    /// Build a DLL when inference finds no `main`.
    pub dll_by_default: bool,
    /// Build a plugin when inference finds no `main`.
    pub plugin_by_default: bool,
    /// Language forced on the command line.
    pub language: Option<Language>,
    /// Pass `--debug` to the driver.
    pub debug: bool,
    /// Pass `--quiet` to the driver.
    pub quiet: bool,
    /// Environment handed to delegate processes, in `name=value` order.
    pub delegate_env: Vec<(String, String)>,
    /// Compiler driver program.
    pub driver: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            objects_dir: DEFAULT_OBJECTS_DIR.to_string(),
            deps_dir: DEFAULT_DEPS_DIR.to_string(),
            install_prefix: None,
            keep_going: false,
            dll_by_default: false,
            plugin_by_default: false,
            language: None,
            debug: false,
            quiet: false,
            delegate_env: Vec::new(),
            driver: DRIVER.to_string(),
        }
    }
}

impl Settings {
    /// Read `OBJDIR`, `DCCDEPS` and the delegate allow-list through `lookup`.
    ///
    /// Empty values count as unset.
    ///
    /// ```
    /// use dmake_cli::config::settings::Settings;
    ///
    /// let settings = Settings::default().with_environment(|name| match name {
    ///     "OBJDIR" => Some("build".to_string()),
    ///     "PATH" => Some("/bin".to_string()),
    ///     "HOME" => Some(String::new()),
    ///     _ => None,
    /// });
    /// assert_eq!(settings.objects_dir, "build");
    /// assert_eq!(settings.deps_dir, ".dcc.d");
    /// assert_eq!(settings.delegate_env, [("PATH".to_string(), "/bin".to_string())]);
    /// ```
    #[must_use]
    pub fn with_environment(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(dir) = non_empty("OBJDIR") {
            self.objects_dir = dir;
        }
        if let Some(dir) = non_empty("DCCDEPS") {
            self.deps_dir = dir;
        }
        for name in DELEGATE_ENV_ALLOW_LIST {
            if let Some(value) = non_empty(name) {
                self.delegate_env.push((name.to_string(), value));
            }
        }
        self
    }

    /// Append inline `name=value` assignments to the delegate environment.
    #[must_use]
    pub fn with_assignments(mut self, assignments: Vec<(String, String)>) -> Self {
        self.delegate_env.extend(assignments);
        self
    }

    /// The prefix to install under when no `.dmake` supplies one.
    #[must_use]
    pub fn prefix_or_default(prefix: Option<&str>) -> PathBuf {
        PathBuf::from(prefix.filter(|p| !p.is_empty()).unwrap_or("."))
    }
}

/// Split `name=value` arguments (with `=` at index 1 or later) out of a
/// positional argument list.
///
/// ```
/// use dmake_cli::config::settings::split_assignments;
///
/// let args = ["CC=clang", "clean", "=x"].map(String::from).to_vec();
/// let (rest, env) = split_assignments(args);
/// assert_eq!(rest, ["clean", "=x"]);
/// assert_eq!(env, [("CC".to_string(), "clang".to_string())]);
/// ```
#[must_use]
pub fn split_assignments(args: Vec<String>) -> (Vec<String>, Vec<(String, String)>) {
    let mut rest = Vec::new();
    let mut env = Vec::new();
    for arg in args {
        match arg.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                env.push((name.to_string(), value.to_string()));
            }
            _ => rest.push(arg),
        }
    }
    (rest, env)
}
