//! External command execution.
//!
//! Every process dmake starts is described by a [`DelegateCommand`] and run
//! through an [`Executor`], so tests can record commands instead of running
//! them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::DelegateError;

/// A fully specified external command: program, arguments, working
/// directory and the complete environment it runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl DelegateCommand {
    #[must_use]
    pub fn new(program: impl Into<String>, current_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.to_path_buf(),
            env: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replace the environment.
    #[must_use]
    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env = env.to_vec();
        self
    }
}

impl fmt::Display for DelegateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs delegate processes to completion.
///
/// The production implementation is [`SystemExecutor`]; tests substitute a
/// recording or mock implementation.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    /// Run `cmd` and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`DelegateError::Launch`] if the process cannot be started and
    /// [`DelegateError::Failed`] if it exits unsuccessfully.
    fn run(&self, cmd: &DelegateCommand) -> Result<(), DelegateError>;
}

/// Executes commands with [`std::process::Command`].
///
/// The child gets no stdin, inherits stdout and stderr, and sees only the
/// environment in the [`DelegateCommand`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, cmd: &DelegateCommand) -> Result<(), DelegateError> {
        tracing::debug!("RUN: {cmd}");
        let status = Command::new(&cmd.program)
            .args(&cmd.args)
            .current_dir(&cmd.current_dir)
            .env_clear()
            .envs(cmd.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| DelegateError::Launch {
                program: cmd.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(DelegateError::Failed {
                program: cmd.program.clone(),
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn host_env() -> Vec<(String, String)> {
        std::env::var("PATH")
            .map(|p| vec![("PATH".to_string(), p)])
            .unwrap_or_default()
    }

    #[test]
    fn display_joins_arguments() {
        let cmd = DelegateCommand::new("dcc", Path::new("."))
            .arg("--exe")
            .args(["fred", "main.cpp"]);
        assert_eq!(cmd.to_string(), "dcc --exe fred main.cpp");
    }

    #[cfg(not(windows))]
    #[test]
    fn run_success() {
        let dir = std::env::temp_dir();
        let cmd = DelegateCommand::new("true", &dir).envs(&host_env());
        SystemExecutor.run(&cmd).expect("true should succeed");
    }

    #[cfg(not(windows))]
    #[test]
    fn run_failure_reports_exit_code() {
        let dir = std::env::temp_dir();
        let cmd = DelegateCommand::new("sh", &dir)
            .args(["-c", "exit 3"])
            .envs(&host_env());
        let err = SystemExecutor.run(&cmd).unwrap_err();
        assert!(matches!(err, DelegateError::Failed { code: Some(3), .. }));
    }

    #[cfg(not(windows))]
    #[test]
    fn run_uses_only_given_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = host_env();
        env.push(("DMAKE_TEST_MARKER".to_string(), "yes".to_string()));
        let cmd = DelegateCommand::new("sh", tmp.path())
            .args(["-c", "test \"$DMAKE_TEST_MARKER\" = yes && test -z \"$HOME\""])
            .envs(&env);
        SystemExecutor.run(&cmd).expect("environment should be exactly the given one");
    }

    #[cfg(not(windows))]
    #[test]
    fn run_in_given_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = DelegateCommand::new("sh", tmp.path())
            .args(["-c", "touch here"])
            .envs(&host_env());
        SystemExecutor.run(&cmd).unwrap();
        assert!(tmp.path().join("here").exists());
    }

    #[test]
    fn run_missing_program_is_launch_error() {
        let dir = std::env::temp_dir();
        let cmd = DelegateCommand::new("this-program-does-not-exist-12345", &dir);
        let err = SystemExecutor.run(&cmd).unwrap_err();
        assert!(matches!(err, DelegateError::Launch { .. }));
    }
}
