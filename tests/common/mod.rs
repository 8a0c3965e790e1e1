// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed project tree, a fluent builder for
// populating it, and an executor that records delegate commands instead of
// running them.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dmake_cli::config::Settings;
use dmake_cli::descriptor::BuildDescriptor;
use dmake_cli::error::{DelegateError, Result};
use dmake_cli::exec::{DelegateCommand, Executor};
use dmake_cli::logging::Logger;
use dmake_cli::orchestrator::{Action, Orchestrator};
use dmake_cli::platform::{Os, Platform};
use dmake_cli::sources::RegexMainDetector;

/// An isolated project tree backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct TestProject {
    pub root: tempfile::TempDir,
}

impl TestProject {
    /// Start building a project.
    pub fn builder() -> TestProjectBuilder {
        TestProjectBuilder::default()
    }

    /// Path to the project root.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Path of `rel` inside the project.
    pub fn join(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Contents of `rel`, panicking if it cannot be read.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.join(rel)).expect("read project file")
    }
}

/// Fluent builder for [`TestProject`].
#[derive(Default)]
pub struct TestProjectBuilder {
    files: Vec<(String, String)>,
    dirs: Vec<String>,
}

impl TestProjectBuilder {
    /// Add a file, creating parent directories as needed.
    pub fn with_file(mut self, rel: &str, content: &str) -> Self {
        self.files.push((rel.to_string(), content.to_string()));
        self
    }

    /// Add a `.dmake` file in the directory `dir` (`""` for the root).
    pub fn with_dmake(self, dir: &str, content: &str) -> Self {
        let rel = if dir.is_empty() {
            ".dmake".to_string()
        } else {
            format!("{dir}/.dmake")
        };
        self.with_file(&rel, content)
    }

    /// Add an empty directory.
    pub fn with_dir(mut self, rel: &str) -> Self {
        self.dirs.push(rel.to_string());
        self
    }

    pub fn build(self) -> TestProject {
        let root = tempfile::tempdir().expect("create temp dir");
        for dir in &self.dirs {
            std::fs::create_dir_all(root.path().join(dir)).expect("create dir");
        }
        for (rel, content) in &self.files {
            let path = root.path().join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create parent dir");
            }
            std::fs::write(&path, content).expect("write file");
        }
        TestProject { root }
    }
}

/// Records every delegate command; fails those run in a directory whose
/// name is listed in `fail_in`.
#[derive(Default)]
pub struct RecordingExecutor {
    pub commands: Mutex<Vec<DelegateCommand>>,
    pub fail_in: Vec<String>,
}

impl RecordingExecutor {
    pub fn failing_in(dirs: &[&str]) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_in: dirs.iter().map(ToString::to_string).collect(),
        }
    }

    /// All recorded commands, in order.
    pub fn commands(&self) -> Vec<DelegateCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Recorded `dcc` commands only.
    pub fn driver_commands(&self) -> Vec<DelegateCommand> {
        self.commands()
            .into_iter()
            .filter(|c| c.program == "dcc")
            .collect()
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, cmd: &DelegateCommand) -> std::result::Result<(), DelegateError> {
        self.commands.lock().unwrap().push(cmd.clone());
        let fails = cmd
            .current_dir
            .file_name()
            .is_some_and(|n| self.fail_in.iter().any(|f| n == f.as_str()));
        if fails {
            Err(DelegateError::Failed {
                program: cmd.program.clone(),
                code: Some(1),
            })
        } else {
            Ok(())
        }
    }
}

/// An ELF-style host, whatever the test machine is.
pub fn linux() -> Platform {
    Platform::new(Os::Linux, "x86_64")
}

/// Run `action` in `dir` the way the build command does, with the regex
/// main detector and the given executor.
pub fn run_in(
    dir: &Path,
    action: Action,
    settings: &Settings,
    executor: &RecordingExecutor,
    log: &Logger,
) -> Result<()> {
    let platform = linux();
    let detector = RegexMainDetector::default();
    let orch = Orchestrator::new(&platform, settings, executor, &detector, log);
    let desc = BuildDescriptor::new(dir, None, settings.install_prefix.clone());
    orch.run(dir, action, desc)
}

/// Arguments of a recorded command as string slices.
pub fn args(cmd: &DelegateCommand) -> Vec<&str> {
    cmd.args.iter().map(String::as_str).collect()
}
