//! Sequential descent into sub-directories with keep-going semantics.

use std::io;
use std::path::{Path, PathBuf};

use crate::descriptor::BuildDescriptor;
use crate::error::{FsError, Result};
use crate::logging::DirStatus;
use crate::orchestrator::{Action, Orchestrator};

/// Run `action` in each of `dirs`, relative to `base`, in order.
///
/// Every directory gets a fresh [`BuildDescriptor`]. Without keep-going the
/// first failure ends the walk; with it the remaining directories still run
/// and the first failure is returned at the end. Each outcome is recorded
/// on the orchestrator's logger.
///
/// # Errors
///
/// Returns the first error raised by any directory.
pub fn walk(
    orch: &Orchestrator<'_>,
    base: &Path,
    dirs: &[PathBuf],
    action: Action,
    install_prefix: Option<&str>,
) -> Result<()> {
    let mut first_error = None;
    for dir in dirs {
        let child = base.join(dir);
        orch.log.info(&format!("entering {:?}", dir.display().to_string()));
        let result = visit(orch, &child, action, install_prefix);
        orch.log.info(&format!(" leaving {:?}", dir.display().to_string()));

        match result {
            Ok(()) => orch.log.record_dir(&child, DirStatus::Ok, None),
            Err(e) => {
                orch.log
                    .record_dir(&child, DirStatus::Failed, Some(&e.to_string()));
                if !orch.settings.keep_going {
                    return Err(e);
                }
                orch.log.debug(&format!("{}: {e}, keeping going", dir.display()));
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn visit(
    orch: &Orchestrator<'_>,
    dir: &Path,
    action: Action,
    install_prefix: Option<&str>,
) -> Result<()> {
    let meta = std::fs::metadata(dir).map_err(FsError::wrap("enter directory", dir))?;
    if !meta.is_dir() {
        return Err(FsError::wrap("enter directory", dir)(io::Error::new(
            io::ErrorKind::NotADirectory,
            "not a directory",
        ))
        .into());
    }
    let desc = BuildDescriptor::new(dir, None, install_prefix.map(String::from));
    orch.run(dir, action, desc)
}
