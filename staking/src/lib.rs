//! Staking on top of the balance ledger.
//!
//! Holders lock part of their balance into a pooled custody account, later
//! withdraw it, and separately claim rewards accrued on what they hold.
//! Rewards are newly minted supply:
//! `reward = staked × apr_bps × elapsed / (10_000 × SECONDS_PER_YEAR)`
//!
//! This crate handles:
//! - The accrual rule and per-account stake records
//! - Stake, unstake and claim with all-or-nothing settlement
//! - The `StakeToken` facade combining ledger, registry, clock and events
//! - Persisting registry state through a `StakeStore`

pub mod accrual;
pub mod bus;
pub mod error;
pub mod record;
pub mod registry;
pub mod token;

pub use accrual::RewardRate;
pub use bus::EventBus;
pub use error::StakingError;
pub use record::StakeRecord;
pub use registry::{Receipt, StakeRegistry};
pub use token::StakeToken;
