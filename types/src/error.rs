//! Errors raised while parsing fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("account id must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("account id must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("account id is not valid hex: {0}")]
    InvalidHex(String),
}
