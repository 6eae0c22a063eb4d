//! Staking errors.
//!
//! The display strings of the caller-facing variants are stable and meant for
//! exact matching by clients.

use tally_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StakingError {
    #[error("enter valid amount")]
    InvalidAmount,

    #[error("amount is greater than token balance")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("amount is greater than staked balance")]
    InsufficientStake { requested: u128, staked: u128 },

    #[error("staked amount is zero")]
    NoStake,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("custody account is reserved for staked principal")]
    ReservedAccount,

    #[error("custody holds {held}, below the {required} owed to stakers")]
    CustodyShortfall { required: u128, held: u128 },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Storage(#[from] tally_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
