//! Library half of the `tally` binary: configuration and script replay.

pub mod config;
pub mod script;

pub use config::{CliConfig, ConfigError};
pub use script::{run_script, Script, Step, Summary};
