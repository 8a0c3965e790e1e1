//! Configuration: the variable store, the `.dmake` and source-list parsers,
//! and process-wide settings.

pub mod dmakefile;
pub mod settings;
pub mod source_list;
pub mod vars;

pub use settings::Settings;
pub use vars::{Operator, Variable, Vars};

/// Name of the per-directory configuration file.
pub const DMAKEFILE: &str = ".dmake";

/// Keys read from a `.dmake` file.
pub mod keys {
    /// Source glob patterns.
    pub const SRCS: &str = "SRCS";
    /// Path of a source-list file.
    pub const SRCSFILE: &str = "SRCSFILE";
    /// Sub-directory glob patterns.
    pub const DIRS: &str = "DIRS";
    /// Installation prefix.
    pub const PREFIX: &str = "PREFIX";
}
