use tally_types::AccountId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, available {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("arithmetic overflow in ledger")]
    Overflow,

    #[error("{0} is not an authorized minter")]
    Unauthorized(AccountId),

    #[error("storage error: {0}")]
    Storage(#[from] tally_store::StoreError),
}
