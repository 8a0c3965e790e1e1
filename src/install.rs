//! Copying a built module into its installation directory.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{FsError, Result};
use crate::exec::{DelegateCommand, Executor};
use crate::naming::ModuleKind;
use crate::platform::{InstallMethod, Platform};

/// Mode given to installed executables.
pub const EXE_MODE: u32 = 0o555;

/// Mode given to installed libraries, DLLs and plugins.
pub const LIB_MODE: u32 = 0o444;

/// Where and how one output file is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// Output file relative to the module directory.
    pub file: PathBuf,
    /// Destination directory, `<prefix>/bin` or `<prefix>/lib`.
    pub dest_dir: PathBuf,
    /// Full destination path.
    pub dest: PathBuf,
    /// Permission bits for the installed file.
    pub mode: u32,
}

impl InstallPlan {
    /// Plan the installation of `output` built as `kind`.
    ///
    /// A relative `prefix` is taken relative to the module directory `base`.
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use dmake_cli::install::InstallPlan;
    /// use dmake_cli::naming::ModuleKind;
    ///
    /// let plan = InstallPlan::new(Path::new("/src/fred"), ModuleKind::Exe, "out/fred", Path::new("/usr/local"));
    /// assert_eq!(plan.dest, PathBuf::from("/usr/local/bin/fred"));
    /// assert_eq!(plan.mode, 0o555);
    /// ```
    #[must_use]
    pub fn new(base: &Path, kind: ModuleKind, output: &str, prefix: &Path) -> Self {
        let (subdir, mode) = match kind {
            ModuleKind::Exe => ("bin", EXE_MODE),
            ModuleKind::Lib | ModuleKind::Dll | ModuleKind::Plugin => ("lib", LIB_MODE),
        };
        let file = PathBuf::from(output);
        let dest_dir = base.join(prefix).join(subdir);
        let dest = file
            .file_name()
            .map_or_else(|| dest_dir.clone(), |name| dest_dir.join(name));
        Self {
            file,
            dest_dir,
            dest,
            mode,
        }
    }
}

/// Install according to `plan`, using the platform's install method.
///
/// The destination directory is created first.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, the
/// `install` program fails, or the copy fails.
pub fn install(
    base: &Path,
    plan: &InstallPlan,
    platform: &Platform,
    settings: &Settings,
    executor: &dyn Executor,
) -> Result<()> {
    std::fs::create_dir_all(&plan.dest_dir)
        .map_err(FsError::wrap("create directory", &plan.dest_dir))?;

    match platform.install {
        InstallMethod::InstallProgram => {
            let program = install_program();
            let cmd = DelegateCommand::new(program.to_string_lossy(), base)
                .args(["-c", "-m"])
                .arg(format!("{:04o}", plan.mode))
                .arg(plan.file.to_string_lossy())
                .arg(plan.dest.to_string_lossy())
                .envs(&settings.delegate_env);
            executor.run(&cmd)?;
        }
        InstallMethod::Copy => copy_file(&base.join(&plan.file), &plan.dest, plan.mode)?,
    }
    Ok(())
}

/// The system `install` program, found on `PATH` when possible.
fn install_program() -> PathBuf {
    which::which("install").unwrap_or_else(|_| PathBuf::from("/usr/bin/install"))
}

/// Copy `src` to `dest` and apply `mode`.
///
/// An existing destination is removed first so a read-only file from an
/// earlier install does not block the copy.
///
/// # Errors
///
/// Returns an error if any filesystem operation fails.
pub fn copy_file(src: &Path, dest: &Path, mode: u32) -> Result<()> {
    tracing::debug!("COPY: {} -> {}", src.display(), dest.display());
    if dest.exists() {
        set_mode(dest, 0o644)?;
        std::fs::remove_file(dest).map_err(FsError::wrap("remove", dest))?;
    }
    std::fs::copy(src, dest).map_err(FsError::wrap("copy", src))?;
    set_mode(dest, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(FsError::wrap("set permissions", path))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let mut perms = std::fs::metadata(path)
        .map_err(FsError::wrap("stat", path))?
        .permissions();
    perms.set_readonly(mode & 0o200 == 0);
    std::fs::set_permissions(path, perms).map_err(FsError::wrap("set permissions", path))?;
    Ok(())
}
