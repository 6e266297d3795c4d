//! # loginsight-cli
//!
//! Command-line front end for [`loginsight_api`].
//!
//! Provides commands for:
//! - Session login
//! - Event and aggregate queries built from `field/OPCODE+value` constraints
//! - Message ingestion
//!
//! Settings come from a TOML file (`--config`) with flag and environment
//! overrides.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format, IngestArgs, QueryArgs};
pub use error::CliError;
pub use output::OutputFormat;
