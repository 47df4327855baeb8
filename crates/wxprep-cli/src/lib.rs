#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # wxprep-cli
//!
//! The `wxprep` command: argument parsing, logging setup and one handler
//! per subcommand. The handlers are thin wrappers over `wxprep-ecmwf` and
//! `wxprep-dpird`.

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Command, ConfigAction, DpirdAction};
pub use commands::dispatch;
