//! The `Ledger` capability consumed by the staking registry.

use crate::error::LedgerError;
use tally_types::{AccountId, TokenEvent};

/// Authoritative mapping from account to spendable balance.
///
/// Implementations must reject every operation that would make a balance
/// negative or wrap an integer, and must leave state untouched on error.
pub trait Ledger {
    /// Spendable balance of `account`; zero for unknown accounts.
    fn balance_of(&self, account: &AccountId) -> u128;

    /// Total units ever minted.
    fn total_supply(&self) -> u128;

    /// Whether `account` may call [`Ledger::mint`].
    fn is_authorized_minter(&self, account: &AccountId) -> bool;

    /// Create `amount` new units and credit them to `to`.
    fn mint(
        &mut self,
        minter: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<TokenEvent, LedgerError>;

    /// Atomically debit `from` and credit `to`.
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<TokenEvent, LedgerError>;

    /// Whether minting `amount` more units would overflow total supply.
    ///
    /// Every balance is bounded by total supply, so a mint that fits the
    /// supply also fits the recipient's balance.
    fn can_absorb_mint(&self, amount: u128) -> bool {
        self.total_supply().checked_add(amount).is_some()
    }
}
