//! Abstract storage traits for the Tally staking token.
//!
//! Every storage backend (in-memory for testing, or a durable database)
//! implements these traits. The engines depend only on the traits and
//! serialize their own types to opaque bytes.

pub mod balance;
pub mod error;
pub mod stake;

pub use balance::BalanceStore;
pub use error::StoreError;
pub use stake::StakeStore;
