//! Per-directory build sequencing: read `.dmake`, recurse, resolve sources,
//! infer the module kind and dispatch the action.

use std::fmt;
use std::path::Path;

use crate::config::{DMAKEFILE, Settings, dmakefile};
use crate::descriptor::BuildDescriptor;
use crate::error::{FsError, ResolutionError, Result, UsageError};
use crate::exec::{DelegateCommand, Executor};
use crate::install::{self, InstallPlan};
use crate::logging::Logger;
use crate::naming::{ModuleKind, dependencies_filename};
use crate::platform::Platform;
use crate::sources::{MainDetector, SourceResolver, infer_kind};
use crate::walker;

/// What an invocation was asked to do.
///
/// `Default` becomes `Building` once the arguments are consumed; `Initing`
/// is handled by the init command and never reaches a directory run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Default,
    Building,
    Cleaning,
    Installing,
    Initing,
}

impl Action {
    /// Parse a positional action keyword.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "build" => Some(Self::Building),
            "clean" => Some(Self::Cleaning),
            "install" => Some(Self::Installing),
            "init" => Some(Self::Initing),
            _ => None,
        }
    }

    /// The action actually carried out in a directory.
    #[must_use]
    pub const fn resolve(self) -> Self {
        match self {
            Self::Default => Self::Building,
            other => other,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Building => "build",
            Self::Cleaning => "clean",
            Self::Installing => "install",
            Self::Initing => "init",
        })
    }
}

/// Runs one directory level at a time.
///
/// Holds only borrowed, read-only collaborators; all per-directory state
/// lives in the [`BuildDescriptor`] passed to [`Orchestrator::run`].
pub struct Orchestrator<'a> {
    pub(crate) platform: &'a Platform,
    pub(crate) settings: &'a Settings,
    executor: &'a dyn Executor,
    detector: &'a dyn MainDetector,
    pub(crate) log: &'a Logger,
}

impl fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("platform", &self.platform)
            .field("settings", &self.settings)
            .field("executor", &"<dyn Executor>")
            .field("detector", &"<dyn MainDetector>")
            .field("log", &self.log)
            .finish()
    }
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub const fn new(
        platform: &'a Platform,
        settings: &'a Settings,
        executor: &'a dyn Executor,
        detector: &'a dyn MainDetector,
        log: &'a Logger,
    ) -> Self {
        Self {
            platform,
            settings,
            executor,
            detector,
            log,
        }
    }

    /// Run `action` in the directory `base`.
    ///
    /// # Errors
    ///
    /// Returns the first error from configuration parsing, sub-directory
    /// recursion, source resolution or a delegate process.
    pub fn run(&self, base: &Path, action: Action, mut desc: BuildDescriptor) -> Result<()> {
        let action = action.resolve();
        if action == Action::Initing {
            return Err(UsageError("init only runs in the current directory".to_string()).into());
        }
        let resolver = SourceResolver::new(base, self.platform);

        let config = base.join(DMAKEFILE);
        if let Some(vars) = dmakefile::parse_file(&config, self.platform)? {
            self.log.debug(&format!("read {}", config.display()));
            desc.apply_vars(&vars, &resolver, &self.platform.naming)?;
        }

        if desc.has_subdirectories() {
            walker::walk(
                self,
                base,
                &desc.subdirectories,
                action,
                desc.install_prefix.as_deref(),
            )?;
        }

        if desc.sources.is_empty() {
            match resolver.default_sources(self.settings.language)? {
                Some((files, _)) => desc.sources = files,
                None if desc.has_subdirectories() => return Ok(()),
                None => {
                    return Err(ResolutionError::NoSources {
                        dir: base.to_path_buf(),
                    }
                    .into());
                }
            }
        }
        self.log.debug(&format!("sources {:?}", desc.sources));

        let kind = if let Some(kind) = desc.kind {
            kind
        } else {
            let kind = infer_kind(
                base,
                &desc.sources,
                self.detector,
                self.settings.dll_by_default,
                self.settings.plugin_by_default,
            );
            desc.set_kind(kind, "inferred")?;
            kind
        };
        desc.synthesize_name(&self.platform.naming);
        self.log.debug(&format!("{action} {kind} {}", desc.output_name));

        match action {
            Action::Cleaning => {
                self.clean(base, &desc);
                Ok(())
            }
            Action::Installing => {
                self.build(base, kind, &desc)?;
                self.install(base, kind, &desc)
            }
            _ => self.build(base, kind, &desc),
        }
    }

    /// Remove the output and every object and dependency file.
    ///
    /// Failures are ignored: a clean tree has nothing to remove.
    fn clean(&self, base: &Path, desc: &BuildDescriptor) {
        let objs = self.settings.objects_dir.as_str();
        let deps = self.settings.deps_dir.as_str();
        remove_quietly(&base.join(&desc.output_name), None);
        for source in &desc.sources {
            let object = self.platform.naming.object_filename(source, objs);
            let dependencies = dependencies_filename(&object, objs, deps);
            remove_quietly(&base.join(&object), Some(objs));
            remove_quietly(&base.join(&dependencies), Some(deps));
        }
    }

    fn build(&self, base: &Path, kind: ModuleKind, desc: &BuildDescriptor) -> Result<()> {
        let output = base.join(&desc.output_name);
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(FsError::wrap("create directory", parent))?;
        }
        let objs = base.join(&self.settings.objects_dir);
        std::fs::create_dir_all(&objs).map_err(FsError::wrap("create directory", &objs))?;

        let mut cmd = DelegateCommand::new(self.settings.driver.as_str(), base);
        if self.settings.debug {
            cmd = cmd.arg("--debug");
        }
        if self.settings.quiet {
            cmd = cmd.arg("--quiet");
        }
        let cmd = cmd
            .arg(kind.driver_flag())
            .arg(desc.output_name.as_str())
            .arg("--objdir")
            .arg(self.settings.objects_dir.as_str())
            .args(desc.sources.iter().map(|s| s.to_string_lossy()))
            .envs(&self.settings.delegate_env);
        self.log.debug(&format!("env {:?}", self.settings.delegate_env));
        self.executor.run(&cmd)?;
        Ok(())
    }

    fn install(&self, base: &Path, kind: ModuleKind, desc: &BuildDescriptor) -> Result<()> {
        let prefix = Settings::prefix_or_default(desc.install_prefix.as_deref());
        let plan = InstallPlan::new(base, kind, &desc.output_name, &prefix);
        self.log
            .info(&format!("installing {} in {}", desc.output_name, plan.dest_dir.display()));
        install::install(base, &plan, self.platform, self.settings, self.executor)
    }
}

/// Remove `path`, then its directory when that directory is named
/// `deletable`.
fn remove_quietly(path: &Path, deletable: Option<&str>) {
    if std::fs::remove_file(path).is_ok() {
        tracing::debug!("removed {}", path.display());
    }
    if let Some(name) = deletable
        && let Some(dir) = path.parent()
        && dir.file_name().is_some_and(|n| n == name)
    {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::{DelegateError, DmakeError};
    use crate::exec::MockExecutor;
    use crate::platform::Os;
    use crate::sources::MockMainDetector;
    use std::fs;
    use std::path::PathBuf;

    fn linux() -> Platform {
        Platform::new(Os::Linux, "x86_64")
    }

    fn args_of(cmd: &DelegateCommand) -> Vec<&str> {
        cmd.args.iter().map(String::as_str).collect()
    }

    #[test]
    fn action_keywords() {
        assert_eq!(Action::from_keyword("clean"), Some(Action::Cleaning));
        assert_eq!(Action::from_keyword("install"), Some(Action::Installing));
        assert_eq!(Action::from_keyword("exe"), None);
        assert_eq!(Action::Default.resolve(), Action::Building);
        assert_eq!(Action::Cleaning.resolve(), Action::Cleaning);
    }

    #[test]
    fn executable_with_main() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("fred");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("main.cpp"), "int main(int argc, char**argv) {}\n").unwrap();

        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let mut detector = MockMainDetector::new();
        detector.expect_defines_main().times(1).returning(|_| true);
        let mut executor = MockExecutor::new();
        let expected_dir = dir.clone();
        executor
            .expect_run()
            .withf(move |cmd| {
                cmd.program == "dcc"
                    && cmd.current_dir == expected_dir
                    && args_of(cmd) == ["--exe", "fred", "--objdir", ".objs", "main.cpp"]
            })
            .times(1)
            .returning(|_| Ok(()));

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        orch.run(&dir, Action::Default, BuildDescriptor::new(&dir, None, None))
            .unwrap();
        assert!(dir.join(".objs").is_dir());
    }

    #[test]
    fn library_named_after_parent_of_src() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("widget/src");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.cpp"), "int a() { return 1; }\n").unwrap();
        fs::write(dir.join("b.cpp"), "int b() { return 2; }\n").unwrap();

        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let mut detector = MockMainDetector::new();
        detector.expect_defines_main().times(2).returning(|_| false);
        let mut executor = MockExecutor::new();
        executor
            .expect_run()
            .withf(|cmd| {
                args_of(cmd) == ["--lib", "libwidget.a", "--objdir", ".objs", "a.cpp", "b.cpp"]
            })
            .times(1)
            .returning(|_| Ok(()));

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        orch.run(&dir, Action::Building, BuildDescriptor::new(&dir, None, None))
            .unwrap();
    }

    #[test]
    fn dmake_file_forces_dll() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join(".dmake"), "SRCS = *.c\nDLL = mything\n").unwrap();
        fs::write(dir.join("main.c"), "int main(void) { return 0; }\n").unwrap();
        fs::write(dir.join("util_windows.c"), "").unwrap();

        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let mut detector = MockMainDetector::new();
        detector.expect_defines_main().never();
        let mut executor = MockExecutor::new();
        executor
            .expect_run()
            .withf(|cmd| {
                args_of(cmd) == ["--dll", "libmything.so", "--objdir", ".objs", "main.c"]
            })
            .times(1)
            .returning(|_| Ok(()));

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        orch.run(dir, Action::Default, BuildDescriptor::new(dir, None, None))
            .unwrap();
    }

    #[test]
    fn driver_flags_precede_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("x.c"), "").unwrap();

        let platform = linux();
        let settings = Settings {
            debug: true,
            quiet: true,
            dll_by_default: true,
            ..Settings::default()
        };
        let log = Logger::new();
        let mut detector = MockMainDetector::new();
        detector.expect_defines_main().returning(|_| false);
        let mut executor = MockExecutor::new();
        executor
            .expect_run()
            .withf(|cmd| {
                args_of(cmd)[..4] == ["--debug", "--quiet", "--dll", "out"]
            })
            .times(1)
            .returning(|_| Ok(()));

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        orch.run(dir, Action::Building, BuildDescriptor::new(dir, Some("out"), None))
            .unwrap();
    }

    #[test]
    fn no_sources_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let detector = MockMainDetector::new();
        let executor = MockExecutor::new();

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        let err = orch
            .run(tmp.path(), Action::Building, BuildDescriptor::new(tmp.path(), None, None))
            .unwrap_err();
        assert!(matches!(
            err,
            DmakeError::Resolution(ResolutionError::NoSources { .. })
        ));
    }

    #[test]
    fn delegate_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("x.c"), "").unwrap();
        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let mut detector = MockMainDetector::new();
        detector.expect_defines_main().returning(|_| false);
        let mut executor = MockExecutor::new();
        executor.expect_run().times(1).returning(|cmd| {
            Err(DelegateError::Failed {
                program: cmd.program.clone(),
                code: Some(1),
            })
        });

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        let err = orch
            .run(tmp.path(), Action::Installing, BuildDescriptor::new(tmp.path(), None, None))
            .unwrap_err();
        assert_eq!(err.to_string(), "dcc failed (exit 1)");
    }

    #[test]
    fn install_runs_after_build() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("main.c"), "").unwrap();
        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let mut detector = MockMainDetector::new();
        detector.expect_defines_main().returning(|_| true);

        let mut seq = mockall::Sequence::new();
        let mut executor = MockExecutor::new();
        executor
            .expect_run()
            .withf(|cmd| cmd.program == "dcc")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let dest = dir.join("stage/bin/prog");
        executor
            .expect_run()
            .withf(move |cmd| {
                cmd.args.last().map(PathBuf::from) == Some(dest.clone())
                    && cmd.args.get(2).map(String::as_str) == Some("0555")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        let desc = BuildDescriptor::new(dir, Some("prog"), Some("stage".to_string()));
        orch.run(dir, Action::Installing, desc).unwrap();
        assert!(dir.join("stage/bin").is_dir());
    }

    #[test]
    fn clean_removes_outputs_and_object_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("main.c"), "").unwrap();
        fs::write(dir.join("prog"), "binary").unwrap();
        fs::create_dir(dir.join(".objs")).unwrap();
        fs::write(dir.join(".objs/main.o"), "object").unwrap();
        fs::create_dir(dir.join("keep")).unwrap();

        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let mut detector = MockMainDetector::new();
        detector.expect_defines_main().returning(|_| true);
        let mut executor = MockExecutor::new();
        executor.expect_run().never();

        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        orch.run(dir, Action::Cleaning, BuildDescriptor::new(dir, Some("prog"), None))
            .unwrap();
        assert!(!dir.join("prog").exists());
        assert!(!dir.join(".objs").exists());
        assert!(dir.join("main.c").exists());
        assert!(dir.join("keep").is_dir());
    }

    #[test]
    fn init_is_not_a_directory_action() {
        let tmp = tempfile::tempdir().unwrap();
        let platform = linux();
        let settings = Settings::default();
        let log = Logger::new();
        let detector = MockMainDetector::new();
        let executor = MockExecutor::new();
        let orch = Orchestrator::new(&platform, &settings, &executor, &detector, &log);
        let err = orch
            .run(tmp.path(), Action::Initing, BuildDescriptor::new(tmp.path(), None, None))
            .unwrap_err();
        assert!(matches!(err, DmakeError::Usage(_)));
    }
}
