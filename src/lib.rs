//! Build orchestration in front of the `dcc` compiler driver.
//!
//! dmake decides what to build in a directory (the source files, the module
//! kind, the output name) with as little configuration as possible, then
//! hands the compilation to `dcc` and the installation to the system
//! `install` program. Directories can list sub-directories to visit in turn.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: the `.dmake` variable store and parsers, and process-wide settings
//! - **[`sources`]**, **[`naming`]**, **[`descriptor`]**: per-directory resolution
//! - **[`orchestrator`]**, **[`walker`]**, **[`install`]**: carrying out an action
//! - **[`commands`]**: top-level command orchestration (build and `init`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod exec;
pub mod install;
pub mod logging;
pub mod naming;
pub mod orchestrator;
pub mod platform;
pub mod sources;
pub mod walker;
