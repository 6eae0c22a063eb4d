//! Fundamental types for the Tally staking token.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identifiers, timestamps and the clock abstraction, token parameters,
//! and the events every operation emits.

pub mod address;
pub mod error;
pub mod event;
pub mod params;
pub mod time;

pub use address::AccountId;
pub use error::AddressError;
pub use event::TokenEvent;
pub use params::TokenParams;
pub use time::{Clock, SystemClock, Timestamp};
