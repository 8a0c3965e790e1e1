//! Command: build, clean or install the module in the base directory and
//! any sub-directories it lists.

use anyhow::{Context, Result};

use super::{CommandSetup, Invocation};
use crate::descriptor::BuildDescriptor;
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::orchestrator::Orchestrator;
use crate::sources::RegexMainDetector;

/// Descriptor for the top-level directory, seeded from the command line.
///
/// A module type given on the command line fixes the kind and, without
/// `-o`, the platform name of the default output.
#[must_use]
pub fn initial_descriptor(
    setup: &CommandSetup,
    output: Option<&str>,
    invocation: &Invocation,
) -> BuildDescriptor {
    let mut desc = BuildDescriptor::new(&setup.base, output, setup.settings.install_prefix.clone());
    desc.kind = invocation.kind;
    desc.synthesize_name(&setup.platform.naming);
    desc.subdirectories.clone_from(&invocation.directories);
    desc
}

/// Run the orchestrator over the base directory.
///
/// # Errors
///
/// Returns the first error from any directory.
pub fn run(
    setup: &CommandSetup,
    output: Option<&str>,
    invocation: &Invocation,
    log: &Logger,
) -> Result<()> {
    let desc = initial_descriptor(setup, output, invocation);
    let executor = SystemExecutor;
    let detector = RegexMainDetector::default();
    let orch = Orchestrator::new(
        &setup.platform,
        &setup.settings,
        &executor,
        &detector,
        log,
    );

    log.stage(&format!(
        "{} in {}",
        invocation.action.resolve(),
        setup.base.display()
    ));
    let result = orch.run(&setup.base, invocation.action, desc);

    log.print_summary();
    result.with_context(|| {
        format!(
            "running {} in {}",
            invocation.action.resolve(),
            setup.base.display()
        )
    })

}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::{DmakeError, ResolutionError};
    use crate::naming::ModuleKind;
    use crate::platform::{Os, Platform};

    fn setup(dir: &std::path::Path) -> CommandSetup {
        CommandSetup {
            platform: Platform::new(Os::Linux, "x86_64"),
            settings: Settings::default(),
            base: dir.to_path_buf(),
        }
    }

    #[test]
    fn module_type_names_default_output() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("widget");
        std::fs::create_dir(&dir).unwrap();
        let inv = Invocation {
            kind: Some(ModuleKind::Dll),
            ..Invocation::default()
        };
        let desc = initial_descriptor(&setup(&dir), None, &inv);
        assert_eq!(desc.kind, Some(ModuleKind::Dll));
        assert_eq!(desc.output_name, "libwidget.so");
    }

    #[test]
    fn dash_o_is_taken_as_is() {
        let tmp = tempfile::tempdir().unwrap();
        let inv = Invocation {
            kind: Some(ModuleKind::Lib),
            ..Invocation::default()
        };
        let desc = initial_descriptor(&setup(tmp.path()), Some("out/thing"), &inv);
        assert_eq!(desc.output_name, "out/thing");
    }

    #[test]
    fn directories_become_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        let inv = Invocation {
            directories: vec!["lib".into(), "app".into()],
            ..Invocation::default()
        };
        let desc = initial_descriptor(&setup(tmp.path()), None, &inv);
        assert!(desc.has_subdirectories());
        assert_eq!(desc.kind, None);
    }

    #[test]
    fn failure_names_the_action_and_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let inv = Invocation {
            action: crate::orchestrator::Action::Cleaning,
            ..Invocation::default()
        };
        let err = run(&setup(tmp.path()), None, &inv, &Logger::new()).unwrap_err();
        let message = format!("{err:#}");
        assert!(
            message.starts_with(&format!("running clean in {}: ", tmp.path().display())),
            "{message}"
        );
        assert!(matches!(
            err.downcast_ref::<DmakeError>(),
            Some(DmakeError::Resolution(ResolutionError::NoSources { .. }))
        ));
    }
}
