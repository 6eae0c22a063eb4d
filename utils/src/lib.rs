//! Shared utilities for the Tally staking token.

pub mod logging;

pub use logging::{init_logging, LogFormat};
