pub mod build;
pub mod init;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Settings;
use crate::config::settings::split_assignments;
use crate::error::{DmakeError, UsageError};
use crate::logging::Logger;
use crate::naming::ModuleKind;
use crate::orchestrator::Action;
use crate::platform::Platform;

/// The positional arguments, sorted into their roles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    /// What to do, [`Action::Default`] when no action keyword was given.
    pub action: Action,
    /// Module type fixed on the command line.
    pub kind: Option<ModuleKind>,
    /// Directories to visit instead of the base directory's `DIRS`.
    pub directories: Vec<PathBuf>,
    /// Arguments following `init`.
    pub init_keywords: Vec<String>,
    /// `name=value` arguments for the delegate environment.
    pub assignments: Vec<(String, String)>,
}

impl Invocation {
    /// Interpret positional arguments.
    ///
    /// `name=value` arguments are taken out first. If `init` comes first the
    /// rest are init keywords; otherwise at most one action and one module
    /// type may appear, and every other argument names a directory.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError`] for a repeated action or module type, a module
    /// type given together with directories, or `init` out of place.
    pub fn parse(args: Vec<String>) -> Result<Self, UsageError> {
        let (args, assignments) = split_assignments(args);
        let mut inv = Self {
            assignments,
            ..Self::default()
        };

        if args.first().is_some_and(|a| a == "init") {
            inv.action = Action::Initing;
            inv.init_keywords = args.into_iter().skip(1).collect();
            return Ok(inv);
        }

        for arg in args {
            if let Some(action) = Action::from_keyword(&arg) {
                if action == Action::Initing {
                    return Err(UsageError("init must be the first argument".to_string()));
                }
                if inv.action != Action::Default {
                    return Err(UsageError(format!(
                        "{arg}: action already specified as {}",
                        inv.action
                    )));
                }
                inv.action = action;
            } else if let Some(kind) = ModuleKind::from_keyword(&arg) {
                if let Some(existing) = inv.kind {
                    return Err(UsageError(format!(
                        "{arg}: module type already specified as {existing}"
                    )));
                }
                inv.kind = Some(kind);
            } else {
                inv.directories.push(PathBuf::from(arg));
            }
        }

        if inv.kind.is_some() && !inv.directories.is_empty() {
            return Err(UsageError(
                "a module type cannot be combined with directories".to_string(),
            ));
        }
        Ok(inv)
    }
}

/// Shared state produced by the common command setup sequence.
///
/// Detects the platform, assembles [`Settings`] from the flags and the
/// environment, and checks the `-C` directory.
#[derive(Debug)]
pub struct CommandSetup {
    pub platform: Platform,
    pub settings: Settings,
    /// Directory the command acts in.
    pub base: PathBuf,
}

impl CommandSetup {
    /// # Errors
    ///
    /// Returns an error if the `-C` directory does not exist.
    pub fn init(cli: &Cli, assignments: Vec<(String, String)>, log: &Logger) -> Result<Self> {
        let platform = Platform::detect();
        log.debug(&format!("platform {} {}", platform.os, platform.arch));

        let base = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
        let meta = std::fs::metadata(&base)
            .with_context(|| format!("entering directory {}", base.display()))?;
        if !meta.is_dir() {
            anyhow::bail!("{}: not a directory", base.display());
        }

        let settings = Settings {
            install_prefix: cli.prefix.clone().filter(|p| !p.is_empty()),
            keep_going: cli.keep_going,
            dll_by_default: cli.dll,
            plugin_by_default: cli.plugin,
            language: cli.lang,
            debug: cli.debug,
            quiet: cli.quiet,
            ..Settings::default()
        }
        .with_environment(|name| std::env::var(name).ok())
        .with_assignments(assignments);
        log.debug(&format!(
            "objects in {}, dependencies in {}",
            settings.objects_dir, settings.deps_dir
        ));

        Ok(Self {
            platform,
            settings,
            base,
        })
    }
}

/// Whether `e` reports a bad command line rather than a failed command.
///
/// Looks through any context added on the way up.
#[must_use]
pub fn is_usage_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<UsageError>().is_some()
        || matches!(e.downcast_ref::<DmakeError>(), Some(DmakeError::Usage(_)))
}

/// Interpret the command line and run the selected command.
///
/// # Errors
///
/// Returns the error of the failed command.
pub fn run(cli: &Cli, log: &Logger) -> Result<()> {
    let invocation = Invocation::parse(cli.args.clone())?;
    log.debug(&format!("action {}", invocation.action));
    let setup = CommandSetup::init(cli, invocation.assignments.clone(), log)
        .context("preparing the build settings")?;

    match invocation.action {
        Action::Initing => init::run(
            &setup,
            cli.output.as_deref(),
            &invocation.init_keywords,
            log,
        ),
        _ => build::run(&setup, cli.output.as_deref(), &invocation, log),
    }
}
